use thiserror::Error;

/// Structural failure reading an export. Row- and cell-level problems are
/// tolerated by the extractor and never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("input is not text: invalid UTF-8 after byte {valid_up_to}")]
    NotText { valid_up_to: usize },
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse schema: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid schema: {0}")]
    Invalid(String),
}
