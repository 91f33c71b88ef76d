//! Failing brain implementation - always returns the same error.

use brain_core::{async_trait, Brain, BrainError, Reply, ReplyRequest};

/// A brain whose every call fails with a fixed error.
#[derive(Debug, Clone)]
pub struct FailingBrain {
    error: BrainError,
}

impl FailingBrain {
    /// Create a brain failing with the given error.
    pub fn new(error: BrainError) -> Self {
        Self { error }
    }

    /// Create a brain that always reports a rate limit.
    pub fn rate_limited() -> Self {
        Self::new(BrainError::RateLimited("quota exhausted".to_string()))
    }
}

#[async_trait]
impl Brain for FailingBrain {
    async fn generate(&self, _request: ReplyRequest) -> Result<Reply, BrainError> {
        Err(self.error.clone())
    }

    fn name(&self) -> &str {
        "FailingBrain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_request;

    #[tokio::test]
    async fn test_always_fails() {
        let brain = FailingBrain::rate_limited();
        let err = brain.generate(test_request("hi")).await.unwrap_err();
        assert!(matches!(err, BrainError::RateLimited(_)));
    }
}
