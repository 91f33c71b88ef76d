//! The Brain trait definition.

use async_trait::async_trait;

use crate::error::BrainError;
use crate::message::{Reply, ReplyRequest};

/// A trait for generating an agent's reply to the latest user message.
///
/// Implementations can range from canned responses to full AI backends.
/// This trait is object-safe and can be used with `Arc<dyn Brain>`.
#[async_trait]
pub trait Brain: Send + Sync {
    /// Generate a reply for one chat turn.
    ///
    /// # Arguments
    ///
    /// * `request` - Agent configuration, bounded history and the new message.
    ///
    /// # Returns
    ///
    /// The reply content, or an error if generation failed.
    async fn generate(&self, request: ReplyRequest) -> Result<Reply, BrainError>;

    /// Get a human-readable name for this brain implementation.
    fn name(&self) -> &str;

    /// Check if the brain is ready to generate replies.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }

    /// Gracefully shut down the brain.
    ///
    /// Default implementation does nothing.
    async fn shutdown(&self) -> Result<(), BrainError> {
        Ok(())
    }
}
