//! Canned brain implementation - answers with stock replies.

use async_trait::async_trait;
use brain_core::{Brain, BrainError, Reply, ReplyRequest};
use rand::seq::SliceRandom;

/// Stock replies used when no model provider is configured.
pub const CANNED_REPLIES: [&str; 5] = [
    "I'd be happy to help you with that! Let me create something tailored to your needs.",
    "Great idea! Here's how I would approach this challenge...",
    "That's an excellent question. Based on my expertise, I recommend...",
    "Let me craft something perfect for your audience and goals.",
    "I understand exactly what you're looking for. Here's my suggestion...",
];

/// A brain that replies with a random entry from [`CANNED_REPLIES`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedBrain;

impl CannedBrain {
    /// Create a new CannedBrain.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Brain for CannedBrain {
    async fn generate(&self, _request: ReplyRequest) -> Result<Reply, BrainError> {
        let content = CANNED_REPLIES
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| BrainError::Unavailable("no canned replies".to_string()))?;
        Ok(Reply::new(*content))
    }

    fn name(&self) -> &str {
        "CannedBrain"
    }
}
