//! Scripted brain implementation - plays back queued outcomes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use brain_core::{async_trait, Brain, BrainError, Reply, ReplyRequest};
use tokio::sync::Mutex;

/// A brain that returns queued outcomes in order.
///
/// Once the queue is drained it echoes the user's message. Every call is
/// counted and the last request is kept for inspection.
#[derive(Debug, Default)]
pub struct ScriptedBrain {
    outcomes: Mutex<VecDeque<Result<Reply, BrainError>>>,
    last_request: Mutex<Option<ReplyRequest>>,
    calls: AtomicUsize,
}

impl ScriptedBrain {
    /// Create a brain with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a brain from a list of outcomes.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = Result<Reply, BrainError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Queue a successful reply.
    pub async fn push_reply(&self, content: impl Into<String>) {
        self.outcomes.lock().await.push_back(Ok(Reply::new(content)));
    }

    /// Queue a failure.
    pub async fn push_error(&self, error: BrainError) {
        self.outcomes.lock().await.push_back(Err(error));
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request received.
    pub async fn last_request(&self) -> Option<ReplyRequest> {
        self.last_request.lock().await.clone()
    }
}

#[async_trait]
impl Brain for ScriptedBrain {
    async fn generate(&self, request: ReplyRequest) -> Result<Reply, BrainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.outcomes.lock().await.pop_front();
        let echo = Reply::new(request.message.clone());
        *self.last_request.lock().await = Some(request);
        next.unwrap_or(Ok(echo))
    }

    fn name(&self) -> &str {
        "ScriptedBrain"
    }
}
