//! Error taxonomy shared by the balance monitor and the request bridge.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ChatError {
    /// Balance query failed. The last known balance stays in effect.
    #[error("balance fetch failed: {0}")]
    Fetch(String),

    /// The model call returned an error payload
    #[error("{0}")]
    Api(String),

    /// The call itself failed (connection, decoding, HTTP status without a body)
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// A collaborator is missing credentials
    #[error("not configured: {0}")]
    Config(String),
}

impl ChatError {
    /// Failures where nothing usable came back from the call
    pub fn is_transport(&self) -> bool {
        matches!(self, ChatError::Transport(_) | ChatError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_counts_as_transport() {
        assert!(ChatError::Timeout(Duration::from_secs(5)).is_transport());
        assert!(ChatError::Transport("reset".into()).is_transport());
        assert!(!ChatError::Api("rate limited".into()).is_transport());
    }

    #[test]
    fn test_display() {
        let err = ChatError::Timeout(Duration::from_secs(120));
        assert_eq!(err.to_string(), "request timed out after 120s");
        assert_eq!(ChatError::Api("rate limited".into()).to_string(), "rate limited");
    }
}
