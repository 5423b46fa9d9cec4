use thiserror::Error;

/// Failure reported by a [`Transport`](crate::Transport).
///
/// The variant is the retry classification: transient failures may succeed on
/// a later attempt, permanent ones (undecodable payload, rejected request)
/// will not.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transient transport failure: {0}")]
    Transient(String),

    #[error("permanent transport failure: {0}")]
    Permanent(String),
}

impl TransportError {
    pub fn transient(msg: impl Into<String>) -> Self {
        TransportError::Transient(msg.into())
    }

    pub fn permanent(msg: impl Into<String>) -> Self {
        TransportError::Permanent(msg.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Transient(_))
    }

    pub fn message(&self) -> &str {
        match self {
            TransportError::Transient(msg) | TransportError::Permanent(msg) => msg,
        }
    }
}
