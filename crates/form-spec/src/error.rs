use thiserror::Error;

/// Errors raised while reading schema or value documents.
#[derive(Debug, Error)]
pub enum FormSpecError {
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} must be a JSON object")]
    NotAnObject(&'static str),
}
