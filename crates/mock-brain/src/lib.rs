//! Reply generators that need no model provider.
//!
//! - `CannedBrain` - Picks one of the product's stock replies
//! - `EchoBrain` - Echoes the user's message back
//! - `DelayedBrain` - Wraps another brain with artificial latency
//! - `FailingBrain` - Always fails with a fixed error
//! - `ScriptedBrain` - Plays back a queue of outcomes (for tests)
//!
//! # Example
//!
//! ```rust
//! use mock_brain::{Brain, EchoBrain, GenerationSettings, PromptConfig, ReplyRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_brain::BrainError> {
//!     let brain = EchoBrain::new();
//!
//!     let request = ReplyRequest::new(
//!         1,
//!         "Tagline Pro",
//!         PromptConfig::default(),
//!         GenerationSettings::default(),
//!         "Hello!",
//!     );
//!
//!     let reply = brain.generate(request).await?;
//!     println!("Reply: {}", reply.content);
//!     Ok(())
//! }
//! ```

mod canned;
mod delayed;
mod echo;
mod failing;
mod scripted;

// Re-export brain-core types for convenience
pub use brain_core::{
    async_trait, Brain, BrainError, GenerationSettings, PromptConfig, Reply, ReplyRequest,
};

pub use canned::{CannedBrain, CANNED_REPLIES};
pub use delayed::DelayedBrain;
pub use echo::EchoBrain;
pub use failing::FailingBrain;
pub use scripted::ScriptedBrain;

#[cfg(test)]
pub(crate) fn test_request(message: &str) -> ReplyRequest {
    ReplyRequest::new(
        7,
        "Tagline Pro",
        PromptConfig::default(),
        GenerationSettings::default(),
        message,
    )
}
