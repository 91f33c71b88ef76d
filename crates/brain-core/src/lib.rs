//! Core trait and types for reply generator implementations.
//!
//! An agent's replies are produced by a "brain": anything from a canned
//! response table to a hosted model. This crate defines the shared contract:
//!
//! - [`Brain`] - The trait that all reply generators implement
//! - [`ReplyRequest`] / [`Reply`] - Request and response for one turn
//! - [`BrainError`] - Failure kinds a generator may report
//! - [`PromptConfig`] / [`GenerationSettings`] - Per-agent prompt setup
//!
//! # Example
//!
//! ```rust
//! use brain_core::{Brain, BrainError, Reply, ReplyRequest};
//! use async_trait::async_trait;
//!
//! struct MyBrain;
//!
//! #[async_trait]
//! impl Brain for MyBrain {
//!     async fn generate(&self, request: ReplyRequest) -> Result<Reply, BrainError> {
//!         Ok(Reply::new(format!("You said: {}", request.message)))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "MyBrain"
//!     }
//! }
//! ```

mod error;
mod history;
mod message;
mod prompt;
mod trait_def;

pub use error::{BrainError, BrainErrorKind};
pub use history::{HistoryMessage, HistoryRole, HistoryWindow};
pub use message::{Reply, ReplyRequest};
pub use prompt::{hash_prompt, ExampleDialogue, GenerationSettings, PromptConfig};
pub use trait_def::Brain;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
