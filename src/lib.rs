pub mod analysis;
pub mod error;
pub mod extract;
pub mod report;
pub mod schema;

/// Sample export shipped with the tool: a five-row preamble followed by
/// 22 measurement rows for two capillaries.
pub const DEMO_DATASET: &str = include_str!("../data/demo.csv");
