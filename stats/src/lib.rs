use serde::Serialize;

/// p-values below this are reported as a significant difference.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// How the two-tailed p-value is derived from `t` and `df`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PValueMethod {
    /// Closed-form tail estimate `(1 + t²/df)^(-(df+1)/2)`.
    /// Loses accuracy for small df or large t, but is what existing
    /// reports were produced with.
    #[default]
    Approximate,
    /// Student-t tail through the regularized incomplete beta function.
    Exact,
}

/// Outcome of a two-sample comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestResult {
    pub mean_a: f64,
    pub mean_b: f64,
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
}

impl TestResult {
    pub fn is_significant(&self) -> bool {
        self.p_value < SIGNIFICANCE_LEVEL
    }
}

/// Five-number summary for a boxplot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QuartileSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl QuartileSummary {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Arithmetic mean. NaN for an empty slice; callers guard.
pub fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

/// Unbiased (n-1) variance around a precomputed mean.
/// Returns 0.0 without computing when there are fewer than two values.
pub fn sample_variance(data: &[f64], mean: f64) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (data.len() - 1) as f64
}

pub fn variance(data: &[f64]) -> f64 {
    sample_variance(data, mean(data))
}

/// Welch's t-test for two independent samples with unequal variance,
/// using the approximate p-value.
pub fn two_sample_test(group_a: &[f64], group_b: &[f64]) -> TestResult {
    two_sample_test_with(group_a, group_b, PValueMethod::Approximate)
}

/// Welch's t-test with an explicit p-value method.
///
/// Samples with fewer than two values give a neutral result (`t = 0`,
/// `p = 1`) instead of failing.
pub fn two_sample_test_with(group_a: &[f64], group_b: &[f64], method: PValueMethod) -> TestResult {
    let na = group_a.len();
    let nb = group_b.len();

    if na < 2 || nb < 2 {
        return TestResult {
            mean_a: mean_or_zero(group_a),
            mean_b: mean_or_zero(group_b),
            t_statistic: 0.0,
            degrees_of_freedom: (na + nb).saturating_sub(2).max(1) as f64,
            p_value: 1.0,
        };
    }

    let n1 = na as f64;
    let n2 = nb as f64;
    let m1 = mean(group_a);
    let m2 = mean(group_b);
    let s1 = sample_variance(group_a, m1) / n1;
    let s2 = sample_variance(group_b, m2) / n2;
    let se = (s1 + s2).sqrt();

    // Both samples constant: no spread to measure the difference against
    if se == 0.0 {
        let separated = m1 != m2;
        return TestResult {
            mean_a: m1,
            mean_b: m2,
            t_statistic: if separated { f64::INFINITY } else { 0.0 },
            degrees_of_freedom: n1 + n2 - 2.0,
            p_value: if separated { 0.0 } else { 1.0 },
        };
    }

    let t = (m1 - m2).abs() / se;

    // Welch-Satterthwaite degrees of freedom
    let df = (s1 + s2).powi(2) / (s1.powi(2) / (n1 - 1.0) + s2.powi(2) / (n2 - 1.0));

    let p_value = match method {
        PValueMethod::Approximate => approx_two_tailed_p(t, df),
        PValueMethod::Exact => (2.0 * student_t_cdf(-t, df)).min(1.0),
    };

    TestResult {
        mean_a: m1,
        mean_b: m2,
        t_statistic: t,
        degrees_of_freedom: df,
        p_value,
    }
}

fn mean_or_zero(data: &[f64]) -> f64 {
    if data.is_empty() { 0.0 } else { mean(data) }
}

/// Closed-form tail estimate. Not a Student-t CDF.
fn approx_two_tailed_p(t: f64, df: f64) -> f64 {
    (1.0 + t * t / df).powf(-(df + 1.0) / 2.0)
}

/// CDF of Student's t-distribution.
/// P(T <= t) for t < 0 using the regularized incomplete beta function.
fn student_t_cdf(t: f64, df: f64) -> f64 {
    let x = df / (df + t * t);
    0.5 * regularized_beta(x, df / 2.0, 0.5)
}

/// Regularized incomplete beta function I_x(a, b).
fn regularized_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_beta = ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b);
    let prefix = (a * x.ln() + b * (1.0 - x).ln() - ln_beta).exp();

    // I_x(a,b) = 1 - I_{1-x}(b,a) converges faster on this side
    if x < (a + 1.0) / (a + b + 2.0) {
        prefix / a * beta_cf(x, a, b)
    } else {
        1.0 - prefix / b * beta_cf(1.0 - x, b, a)
    }
}

/// Continued fraction for the incomplete beta function (Lentz's algorithm).
fn beta_cf(x: f64, a: f64, b: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 1e-15;
    const TINY: f64 = 1e-30;

    let clamp = |v: f64| if v.abs() < TINY { TINY } else { v };

    let mut c = 1.0_f64;
    let mut d = 1.0 / clamp(1.0 - (a + b) * x / (a + 1.0));
    let mut f = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;

        let num_even = m * (b - m) * x / ((a + 2.0 * m - 1.0) * (a + 2.0 * m));
        d = 1.0 / clamp(1.0 + num_even * d);
        c = clamp(1.0 + num_even / c);
        f *= c * d;

        let num_odd = -(a + m) * (a + b + m) * x / ((a + 2.0 * m) * (a + 2.0 * m + 1.0));
        d = 1.0 / clamp(1.0 + num_odd * d);
        c = clamp(1.0 + num_odd / c);
        let delta = c * d;
        f *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }

    f
}

/// Lanczos approximation for ln(Gamma(x)).
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];

    if x < 0.5 {
        // Reflection formula
        let s = std::f64::consts::PI / (std::f64::consts::PI * x).sin();
        return s.ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut a = COEFFS[0];
    for (i, &c) in COEFFS[1..].iter().enumerate() {
        a += c / (x + 1.0 + i as f64);
    }

    let t = x + 7.5; // x + g + 0.5 where g = 7
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

/// Linear-interpolation quantile over an ascending slice, using the
/// 0-indexed fractional rank `(n-1) * q`. `q` is clamped to `[0, 1]`;
/// an empty slice gives 0.0.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let frac = pos - lo as f64;
    match sorted.get(lo + 1) {
        Some(&next) => sorted[lo] + frac * (next - sorted[lo]),
        None => sorted[lo],
    }
}

/// Five-number summary. An empty sample gives all zeros.
pub fn quartile_summary(data: &[f64]) -> QuartileSummary {
    if data.is_empty() {
        return QuartileSummary::default();
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    QuartileSummary {
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create synthetic samples with deterministic pseudo-noise.
    fn synthetic_samples(center: f64, noise: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = seed;
        (0..n)
            .map(|_| {
                rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
                let uniform = (rng >> 33) as f64 / (1u64 << 31) as f64;
                center + (uniform - 0.5) * 2.0 * noise
            })
            .collect()
    }

    #[test]
    fn mean_of_repeated_value() {
        assert_eq!(mean(&[7.25, 7.25, 7.25]), 7.25);
        assert_eq!(mean(&[-3.0; 5]), -3.0);
    }

    #[test]
    fn mean_of_empty_is_nan() {
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn sample_variance_uses_bessel_correction() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(sample_variance(&data, 3.0), 2.5);
        assert_eq!(variance(&data), 2.5);
    }

    #[test]
    fn sample_variance_short_sample_is_zero() {
        assert_eq!(sample_variance(&[], 0.0), 0.0);
        assert_eq!(sample_variance(&[4.0], 4.0), 0.0);
    }

    #[test]
    fn identical_samples_t_zero_p_one() {
        let data = synthetic_samples(40.0, 2.0, 22, 12345);
        let r = two_sample_test(&data, &data);
        assert_eq!(r.t_statistic, 0.0);
        assert_eq!(r.p_value, 1.0);
        assert!(!r.is_significant());
    }

    #[test]
    fn constant_identical_samples_p_is_one() {
        let data = vec![100.0; 10];
        let r = two_sample_test(&data, &data);
        assert_eq!(r.t_statistic, 0.0);
        assert_eq!(r.p_value, 1.0);
        assert_eq!(r.degrees_of_freedom, 18.0);
    }

    #[test]
    fn constant_distinct_samples_fully_separated() {
        let r = two_sample_test(&[1.0, 1.0, 1.0], &[2.0, 2.0]);
        assert!(r.t_statistic.is_infinite());
        assert_eq!(r.p_value, 0.0);
        assert!(r.is_significant());
    }

    #[test]
    fn argument_order_does_not_change_t_or_p() {
        let a = synthetic_samples(42.0, 1.5, 22, 1);
        let b = synthetic_samples(43.0, 3.0, 17, 99);
        let ab = two_sample_test(&a, &b);
        let ba = two_sample_test(&b, &a);
        assert_eq!(ab.t_statistic, ba.t_statistic);
        assert_eq!(ab.p_value, ba.p_value);
        assert_eq!(ab.degrees_of_freedom, ba.degrees_of_freedom);
        assert_eq!(ab.mean_a, ba.mean_b);
    }

    #[test]
    fn short_sample_gives_neutral_result() {
        let r = two_sample_test(&[1.0], &[5.0, 6.0, 7.0]);
        assert_eq!(r.t_statistic, 0.0);
        assert_eq!(r.p_value, 1.0);
        assert_eq!(r.mean_a, 1.0);
        assert_eq!(r.mean_b, 6.0);
        assert!(r.degrees_of_freedom > 0.0);

        let empty = two_sample_test(&[], &[]);
        assert_eq!(empty.mean_a, 0.0);
        assert_eq!(empty.p_value, 1.0);
        assert_eq!(empty.degrees_of_freedom, 1.0);
    }

    #[test]
    fn welch_matches_hand_computation() {
        // a: mean 2, var 1; b: mean 5, var 2.5
        let a = [1.0, 2.0, 3.0];
        let b = [3.0, 4.0, 5.0, 6.0, 7.0];
        let r = two_sample_test(&a, &b);
        let s1: f64 = 1.0 / 3.0;
        let s2: f64 = 2.5 / 5.0;
        let t = 3.0 / (s1 + s2).sqrt();
        let df = (s1 + s2).powi(2) / (s1 * s1 / 2.0 + s2 * s2 / 4.0);
        let p = (1.0 + t * t / df).powf(-(df + 1.0) / 2.0);
        assert!((r.t_statistic - t).abs() < 1e-12);
        assert!((r.degrees_of_freedom - df).abs() < 1e-12);
        assert!((r.p_value - p).abs() < 1e-12);
    }

    #[test]
    fn clear_shift_is_significant() {
        let a = synthetic_samples(42.0, 1.0, 22, 7);
        let b = synthetic_samples(48.0, 1.0, 22, 8);
        let r = two_sample_test(&a, &b);
        assert!(r.is_significant(), "6um shift should be significant, got p={}", r.p_value);
    }

    #[test]
    fn within_noise_is_not_significant() {
        let a = synthetic_samples(100.0, 50.0, 30, 12345);
        let b = synthetic_samples(101.0, 50.0, 30, 12345);
        let r = two_sample_test(&a, &b);
        assert!(!r.is_significant(), "1% change with high noise, got p={}", r.p_value);
    }

    #[test]
    fn exact_p_value_matches_reference() {
        // t = 2.0, df = 10 (equal n, equal variance) -> two-tailed p ~= 0.07339
        let p = 2.0 * student_t_cdf(-2.0, 10.0);
        assert!((p - 0.073388).abs() < 1e-5, "got {p}");
    }

    #[test]
    fn exact_and_approximate_differ_only_in_p() {
        let a = synthetic_samples(42.0, 2.0, 12, 3);
        let b = synthetic_samples(44.0, 2.0, 12, 4);
        let approx = two_sample_test_with(&a, &b, PValueMethod::Approximate);
        let exact = two_sample_test_with(&a, &b, PValueMethod::Exact);
        assert_eq!(approx.t_statistic, exact.t_statistic);
        assert_eq!(approx.degrees_of_freedom, exact.degrees_of_freedom);
        assert_ne!(approx.p_value, exact.p_value);
        assert_eq!(two_sample_test(&a, &b), approx);
    }

    #[test]
    fn p_value_is_always_valid() {
        for &(mean_a, mean_b, noise) in &[
            (100.0, 100.0, 1.0),
            (100.0, 200.0, 5.0),
            (100.0, 101.0, 100.0),
            (4.3, 4.4, 0.2),
        ] {
            let a = synthetic_samples(mean_a, noise, 22, 11);
            let b = synthetic_samples(mean_b, noise, 22, 13);
            for method in [PValueMethod::Approximate, PValueMethod::Exact] {
                let r = two_sample_test_with(&a, &b, method);
                assert!(
                    r.p_value > 0.0 && r.p_value <= 1.0,
                    "p-value out of range: {} for means ({mean_a}, {mean_b}) with {method:?}",
                    r.p_value
                );
                assert!(r.t_statistic >= 0.0);
                assert!(r.degrees_of_freedom > 0.0);
            }
        }
    }

    #[test]
    fn ln_gamma_matches_known_values() {
        assert!((ln_gamma(1.0)).abs() < 1e-10);
        assert!((ln_gamma(2.0)).abs() < 1e-10);
        assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(0.5) - 0.5 * std::f64::consts::PI.ln()).abs() < 1e-10);
    }

    #[test]
    fn quartiles_of_one_to_four() {
        let q = quartile_summary(&[4.0, 2.0, 1.0, 3.0]);
        assert_eq!(
            q,
            QuartileSummary {
                min: 1.0,
                q1: 1.75,
                median: 2.5,
                q3: 3.25,
                max: 4.0,
            }
        );
        assert_eq!(q.iqr(), 1.5);
    }

    #[test]
    fn quartiles_of_empty_are_zero() {
        assert_eq!(quartile_summary(&[]), QuartileSummary::default());
    }

    #[test]
    fn quartiles_of_single_value() {
        let q = quartile_summary(&[9.5]);
        assert_eq!((q.min, q.q1, q.median, q.q3, q.max), (9.5, 9.5, 9.5, 9.5, 9.5));
    }

    #[test]
    fn quartiles_are_ordered() {
        for seed in 1..20 {
            let data = synthetic_samples(40.0, 10.0, seed as usize, seed);
            let q = quartile_summary(&data);
            assert!(
                q.min <= q.q1 && q.q1 <= q.median && q.median <= q.q3 && q.q3 <= q.max,
                "unordered summary {q:?} for n={seed}"
            );
        }
    }

    #[test]
    fn quantile_endpoints() {
        let sorted = [1.0, 5.0, 9.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 1.0), 9.0);
        assert_eq!(quantile(&sorted, 0.5), 5.0);
        assert_eq!(quantile(&sorted, 0.75), 7.0);
    }

    #[test]
    fn quantile_of_empty_is_zero() {
        assert_eq!(quantile(&[], 0.5), 0.0);
        assert_eq!(quantile(&[], 0.0), 0.0);
    }

    #[test]
    fn quantile_clamps_rank() {
        let sorted = [1.0, 5.0, 9.0];
        assert_eq!(quantile(&sorted, 2.0), 9.0);
        assert_eq!(quantile(&sorted, -0.5), 1.0);
        assert_eq!(quantile(&[3.0], 7.0), 3.0);
    }
}
