//! # Error Types
//!
//! Caller-visible errors of the fetch pipeline.
//!
//! Transport failures never reach callers directly. They are retried,
//! counted by the circuit breaker and, when nothing else is left, carried as
//! the cause of [`DocVaultError::NetworkUnavailable`].

use std::time::Duration;

use docvault_traits::TransportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocVaultError {
    /// Transport and stale-cache fallback are both exhausted.
    #[error("network unavailable for document '{document_id}': {cause}")]
    NetworkUnavailable {
        document_id: String,
        #[source]
        cause: FetchFailure,
    },

    /// Invalid policy values or an unreadable configuration source.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("fetch of document '{document_id}' was cancelled")]
    Cancelled { document_id: String },
}

/// Last underlying cause of a failed network fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// 熔断器处于 OPEN 状态，请求被快速拒绝
    #[error("circuit breaker is open (retry after {retry_after:?})")]
    CircuitOpen { retry_after: Duration },
}

impl DocVaultError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        DocVaultError::Configuration(msg.into())
    }

    pub fn network_unavailable(document_id: impl Into<String>, cause: FetchFailure) -> Self {
        DocVaultError::NetworkUnavailable {
            document_id: document_id.into(),
            cause,
        }
    }

    pub fn is_network_unavailable(&self) -> bool {
        matches!(self, DocVaultError::NetworkUnavailable { .. })
    }

    /// Underlying cause when this is a `NetworkUnavailable` error.
    pub fn fetch_failure(&self) -> Option<&FetchFailure> {
        match self {
            DocVaultError::NetworkUnavailable { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DocVaultError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_network_unavailable_carries_cause() {
        let err = DocVaultError::network_unavailable(
            "doc-1",
            FetchFailure::Transport(TransportError::transient("connection reset")),
        );
        assert!(err.is_network_unavailable());
        assert!(err.to_string().contains("doc-1"));
        assert!(err.to_string().contains("connection reset"));
        assert!(err.source().is_some());
        assert!(matches!(err.fetch_failure(), Some(FetchFailure::Transport(_))));
    }

    #[test]
    fn test_circuit_open_display() {
        let failure = FetchFailure::CircuitOpen {
            retry_after: Duration::from_secs(3),
        };
        assert!(failure.to_string().contains("circuit breaker is open"));
    }

    #[test]
    fn test_configuration_error() {
        let err = DocVaultError::configuration("capacity must be greater than 0");
        assert!(!err.is_network_unavailable());
        assert!(err.fetch_failure().is_none());
        assert_eq!(
            err.to_string(),
            "configuration error: capacity must be greater than 0"
        );
    }
}
