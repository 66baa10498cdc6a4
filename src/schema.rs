use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Rows at the top of an export that never carry data.
pub const PREAMBLE_ROWS: usize = 5;
/// Rows with fewer fields than this are dropped.
pub const MIN_FIELDS: usize = 10;

/// One measured quantity and the two columns holding its groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    pub unit: String,
    pub column_a: usize,
    pub column_b: usize,
}

impl MetricSpec {
    pub fn new(name: &str, unit: &str, column_a: usize, column_b: usize) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            column_a,
            column_b,
        }
    }
}

/// Positional layout of an export: no header lookup, columns are fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default = "default_preamble_rows")]
    pub preamble_rows: usize,
    #[serde(default = "default_min_fields")]
    pub min_fields: usize,
    pub metrics: Vec<MetricSpec>,
}

fn default_preamble_rows() -> usize {
    PREAMBLE_ROWS
}

fn default_min_fields() -> usize {
    MIN_FIELDS
}

impl Default for Schema {
    /// The bonding export layout: four geometry metrics in µm and the
    /// ball pull test in grams.
    fn default() -> Self {
        Self {
            preamble_rows: PREAMBLE_ROWS,
            min_fields: MIN_FIELDS,
            metrics: vec![
                MetricSpec::new("Ball Size", "µm", 1, 2),
                MetricSpec::new("Ball Thickness", "µm", 3, 4),
                MetricSpec::new("Loop Height", "µm", 5, 6),
                MetricSpec::new("Edge Height", "µm", 7, 8),
                MetricSpec::new("BPT", "g", 10, 11),
            ],
        }
    }
}

impl Schema {
    /// Load a schema from a JSON file and validate it.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        let schema: Schema = serde_json::from_str(&content)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.metrics.is_empty() {
            return Err(SchemaError::Invalid("no metrics defined".to_string()));
        }
        if self.min_fields == 0 {
            return Err(SchemaError::Invalid("min_fields must be at least 1".to_string()));
        }
        let mut seen = HashSet::new();
        for m in &self.metrics {
            if !seen.insert(m.name.as_str()) {
                return Err(SchemaError::Invalid(format!("duplicate metric '{}'", m.name)));
            }
        }
        Ok(())
    }

    pub fn metric(&self, name: &str) -> Option<&MetricSpec> {
        self.metrics.iter().find(|m| m.name == name)
    }
}
