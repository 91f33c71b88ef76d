//! Echo brain implementation - echoes messages back.

use async_trait::async_trait;
use brain_core::{Brain, BrainError, Reply, ReplyRequest};

/// A simple brain that echoes the user's message back.
///
/// Useful for testing the turn flow without any AI processing.
#[derive(Debug, Clone, Default)]
pub struct EchoBrain {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoBrain {
    /// Create a new EchoBrain with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoBrain with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_brain::EchoBrain;
    ///
    /// let brain = EchoBrain::with_prefix("Echo: ");
    /// // Will respond with "Echo: <original message>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl Brain for EchoBrain {
    async fn generate(&self, request: ReplyRequest) -> Result<Reply, BrainError> {
        let content = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, request.message),
            None => request.message,
        };

        Ok(Reply::new(content))
    }

    fn name(&self) -> &str {
        "EchoBrain"
    }
}
