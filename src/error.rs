use thiserror::Error;

/// Domain rule violations that are safe to report back to a caller.
///
/// Persistence code returns `anyhow::Result` and wraps these so the HTTP layer
/// can downcast and pick a status code instead of matching on message text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Invalid(String),
}

impl ValidationError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
