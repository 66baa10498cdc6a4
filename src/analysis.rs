use rayon::prelude::*;
use serde::{Serialize, Serializer};
use stats::{PValueMethod, QuartileSummary, quartile_summary, two_sample_test_with};
use tracing::warn;

use crate::extract::{MetricGroups, MetricSamples};

/// Everything the presentation layer needs to draw one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReport {
    pub metric: String,
    pub unit: String,
    pub group_a_samples: Vec<f64>,
    pub group_b_samples: Vec<f64>,
    pub mean_a: f64,
    pub mean_b: f64,
    /// mean_b - mean_a
    pub difference: f64,
    /// difference relative to mean_a; 0 when mean_a is 0
    pub change_pct: f64,
    /// Written to JSON as the string "inf" when both groups are constant
    /// with different means.
    #[serde(serialize_with = "finite_or_string")]
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    pub significant: bool,
    /// Both groups constant and unequal: `t` is infinite and `p` is 0.
    pub fully_separated: bool,
    pub quartiles_a: QuartileSummary,
    pub quartiles_b: QuartileSummary,
}

/// JSON has no infinity; keep the value instead of letting it become null.
fn finite_or_string<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    if v.is_finite() {
        s.serialize_f64(*v)
    } else {
        s.serialize_str(&v.to_string())
    }
}

/// Analyze every metric. Metrics are independent, so they are computed in
/// parallel; the output keeps schema order.
pub fn analyze(groups: &MetricGroups, method: PValueMethod) -> Vec<MetricReport> {
    groups
        .metrics
        .par_iter()
        .map(|samples| analyze_metric(samples, method))
        .collect()
}

pub fn analyze_metric(samples: &MetricSamples, method: PValueMethod) -> MetricReport {
    let (a, b) = (&samples.group_a, &samples.group_b);
    if a.len() < 2 || b.len() < 2 {
        warn!(
            metric = %samples.metric.name,
            n_a = a.len(),
            n_b = b.len(),
            "too few samples for a t-test, reporting no difference"
        );
    }

    let test = two_sample_test_with(a, b, method);
    let difference = test.mean_b - test.mean_a;
    let change_pct = if test.mean_a == 0.0 {
        0.0
    } else {
        difference / test.mean_a
    };

    MetricReport {
        metric: samples.metric.name.clone(),
        unit: samples.metric.unit.clone(),
        group_a_samples: a.clone(),
        group_b_samples: b.clone(),
        mean_a: test.mean_a,
        mean_b: test.mean_b,
        difference,
        change_pct,
        t_statistic: test.t_statistic,
        degrees_of_freedom: test.degrees_of_freedom,
        p_value: test.p_value,
        significant: test.is_significant(),
        fully_separated: test.t_statistic.is_infinite(),
        quartiles_a: quartile_summary(a),
        quartiles_b: quartile_summary(b),
    }
}
