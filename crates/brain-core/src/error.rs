//! Error types for reply generation.

use serde::Serialize;
use thiserror::Error;

/// Errors a reply generator can report.
///
/// Callers treat every variant the same way: the turn failed and the user's
/// message stays in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrainError {
    /// The provider did not answer in time.
    #[error("reply generation timed out")]
    Timeout,

    /// The provider rejected the request due to rate limiting.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider returned an error or an unusable response.
    #[error("provider error: {0}")]
    Provider(String),

    /// The generator is not available (shut down or not configured).
    #[error("brain unavailable: {0}")]
    Unavailable(String),
}

/// Coarse classification of a [`BrainError`], suitable for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BrainErrorKind {
    Timeout,
    RateLimited,
    ProviderError,
    Unavailable,
}

impl BrainError {
    /// Get the kind of this error.
    pub fn kind(&self) -> BrainErrorKind {
        match self {
            BrainError::Timeout => BrainErrorKind::Timeout,
            BrainError::RateLimited(_) => BrainErrorKind::RateLimited,
            BrainError::Provider(_) => BrainErrorKind::ProviderError,
            BrainError::Unavailable(_) => BrainErrorKind::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        assert_eq!(BrainError::Timeout.kind(), BrainErrorKind::Timeout);
        assert_eq!(
            BrainError::RateLimited("slow down".into()).kind(),
            BrainErrorKind::RateLimited
        );
        assert_eq!(
            BrainError::Provider("bad".into()).kind(),
            BrainErrorKind::ProviderError
        );
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&BrainErrorKind::ProviderError).unwrap();
        assert_eq!(json, "\"provider_error\"");
    }
}
