//! Conversation context passed to a brain.
//!
//! The conversation log itself lives in the orchestrator's store; this module
//! only shapes the bounded window a brain sees.

use std::collections::VecDeque;

/// Who wrote a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRole {
    /// The subscribed user.
    User,
    /// The agent persona.
    Agent,
}

impl HistoryRole {
    /// Chat-completion style role name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryRole::User => "user",
            HistoryRole::Agent => "assistant",
        }
    }
}

/// A single message in the conversation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    /// Author of the message.
    pub role: HistoryRole,
    /// Message content
    pub content: String,
}

impl HistoryMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            content: content.into(),
        }
    }

    /// Create an agent message.
    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Agent,
            content: content.into(),
        }
    }
}

/// A bounded, oldest-first window over conversation messages.
///
/// Pushing beyond the limit drops the oldest entry.
///
/// # Example
///
/// ```rust
/// use brain_core::{HistoryMessage, HistoryWindow};
///
/// let mut window = HistoryWindow::new(2);
/// window.push(HistoryMessage::user("First"));
/// window.push(HistoryMessage::agent("Reply"));
/// window.push(HistoryMessage::user("Second"));
///
/// let messages = window.into_vec();
/// assert_eq!(messages.len(), 2);
/// assert_eq!(messages[0].content, "Reply");
/// ```
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    messages: VecDeque<HistoryMessage>,
    max_messages: usize,
}

impl HistoryWindow {
    /// Create an empty window holding at most `max_messages` entries.
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(max_messages.min(64)),
            max_messages,
        }
    }

    /// Append a message, evicting the oldest one when full.
    pub fn push(&mut self, message: HistoryMessage) {
        if self.max_messages == 0 {
            return;
        }
        if self.messages.len() == self.max_messages {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Number of messages currently held.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consume the window, returning messages oldest first.
    pub fn into_vec(self) -> Vec<HistoryMessage> {
        self.messages.into()
    }
}

impl Extend<HistoryMessage> for HistoryWindow {
    fn extend<T: IntoIterator<Item = HistoryMessage>>(&mut self, iter: T) {
        for message in iter {
            self.push(message);
        }
    }
}
