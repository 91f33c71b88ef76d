//! Request and response types for a single reply.

use serde::{Deserialize, Serialize};

use crate::history::HistoryMessage;
use crate::prompt::{GenerationSettings, PromptConfig};

/// Everything a brain needs to answer one turn.
#[derive(Debug, Clone)]
pub struct ReplyRequest {
    /// Agent the reply is generated for.
    pub agent_id: i64,
    /// Agent display name.
    pub agent_name: String,
    /// Prompt configuration of the agent.
    pub prompt: PromptConfig,
    /// Model and sampling settings of the agent.
    pub settings: GenerationSettings,
    /// Bounded window of earlier messages, oldest first.
    ///
    /// Does not include `message`.
    pub history: Vec<HistoryMessage>,
    /// The latest user message.
    pub message: String,
}

impl ReplyRequest {
    /// Create a request with no history.
    pub fn new(
        agent_id: i64,
        agent_name: impl Into<String>,
        prompt: PromptConfig,
        settings: GenerationSettings,
        message: impl Into<String>,
    ) -> Self {
        Self {
            agent_id,
            agent_name: agent_name.into(),
            prompt,
            settings,
            history: Vec::new(),
            message: message.into(),
        }
    }

    /// Attach a history window.
    pub fn with_history(mut self, history: Vec<HistoryMessage>) -> Self {
        self.history = history;
        self
    }
}

/// A generated reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Reply text.
    pub content: String,
}

impl Reply {
    /// Create a reply.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}
