use tracing::debug;

use crate::error::ExtractError;
use crate::schema::{MetricSpec, Schema};

/// Both comparison groups for one metric, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSamples {
    pub metric: MetricSpec,
    pub group_a: Vec<f64>,
    pub group_b: Vec<f64>,
}

/// Samples for every metric of a schema, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricGroups {
    pub metrics: Vec<MetricSamples>,
}

impl MetricGroups {
    fn empty(schema: &Schema) -> Self {
        Self {
            metrics: schema
                .metrics
                .iter()
                .map(|m| MetricSamples {
                    metric: m.clone(),
                    group_a: Vec::new(),
                    group_b: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&MetricSamples> {
        self.metrics.iter().find(|s| s.metric.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricSamples> {
        self.metrics.iter()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Counters from one extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Rows after the preamble.
    pub rows_seen: usize,
    /// Rows dropped for having too few fields.
    pub rows_skipped: usize,
    /// Cells in accepted rows that did not yield a value.
    pub cells_dropped: usize,
}

/// Extract grouped samples from raw export bytes.
/// Fails only if the input is not text at all.
pub fn extract(raw: &[u8], schema: &Schema) -> Result<MetricGroups, ExtractError> {
    extract_with_stats(raw, schema).map(|(groups, _)| groups)
}

pub fn extract_with_stats(
    raw: &[u8],
    schema: &Schema,
) -> Result<(MetricGroups, ExtractStats), ExtractError> {
    let text = std::str::from_utf8(raw).map_err(|e| ExtractError::NotText {
        valid_up_to: e.valid_up_to(),
    })?;
    Ok(extract_str_with_stats(text, schema))
}

pub fn extract_str(text: &str, schema: &Schema) -> MetricGroups {
    extract_str_with_stats(text, schema).0
}

pub fn extract_str_with_stats(text: &str, schema: &Schema) -> (MetricGroups, ExtractStats) {
    let mut groups = MetricGroups::empty(schema);
    let mut stats = ExtractStats::default();

    for (line_no, line) in text.lines().enumerate().skip(schema.preamble_rows) {
        stats.rows_seen += 1;
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < schema.min_fields {
            debug!(line = line_no + 1, fields = fields.len(), "skipping short row");
            stats.rows_skipped += 1;
            continue;
        }

        for samples in &mut groups.metrics {
            for (column, sample) in [
                (samples.metric.column_a, &mut samples.group_a),
                (samples.metric.column_b, &mut samples.group_b),
            ] {
                match fields.get(column).and_then(|f| parse_cell(f)) {
                    Some(v) => sample.push(v),
                    None => stats.cells_dropped += 1,
                }
            }
        }
    }

    debug!(
        rows = stats.rows_seen,
        skipped = stats.rows_skipped,
        dropped_cells = stats.cells_dropped,
        "extracted samples"
    );
    (groups, stats)
}

/// A cell counts only if it holds a finite number.
fn parse_cell(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
