//! Chat turns.
//!
//! A turn takes a conversation through
//! `Idle -> Submitting -> AwaitingReply -> Settled | Failed`. Turns on the
//! same conversation run one at a time; turns on different conversations
//! run in parallel. The user's message is stored before the reply generator
//! is called, and a failed turn keeps it so the reply can be retried
//! without storing it twice.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use brain_core::{Brain, BrainError, BrainErrorKind, HistoryMessage, HistoryWindow, ReplyRequest};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::catalog::{sample_greeting, Catalog};
use crate::conversation::ConversationStore;
use crate::error::{OrchestratorError, Result};
use crate::ledger::SubscriptionLedger;
use crate::model::{Agent, AgentId, ConversationKey, Message, Sender};

/// Default bound on a single reply generation.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of earlier messages sent to the generator.
pub const DEFAULT_HISTORY_WINDOW: usize = 20;

/// Where a conversation is in its current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Idle,
    Submitting,
    AwaitingReply,
    Settled,
    Failed,
}

/// Why a turn ended without an agent reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureReason {
    /// The generator returned an error or timed out.
    Generator { kind: BrainErrorKind, detail: String },
    /// The turn was cancelled while awaiting the reply.
    Cancelled,
    /// The subscription ended before the reply could be stored.
    Unsubscribed,
    /// The reply could not be stored.
    Storage { detail: String },
}

impl From<&BrainError> for FailureReason {
    fn from(err: &BrainError) -> Self {
        FailureReason::Generator {
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}

/// Result of a completed turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutcome {
    Settled {
        user_message: Message,
        agent_message: Message,
    },
    /// The user message is kept; call `retry` to generate the reply again.
    Failed {
        user_message: Message,
        reason: FailureReason,
    },
}

impl TurnOutcome {
    pub fn user_message(&self) -> &Message {
        match self {
            TurnOutcome::Settled { user_message, .. } | TurnOutcome::Failed { user_message, .. } => {
                user_message
            }
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, TurnOutcome::Settled { .. })
    }
}

/// Point-in-time view of a conversation's turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnSnapshot {
    pub state: TurnState,
    /// User message still waiting for a reply, if any.
    pub pending: Option<Message>,
    pub last_failure: Option<FailureReason>,
}

#[derive(Debug)]
struct TurnStatus {
    state: TurnState,
    pending: Option<Message>,
    cancel: Option<CancellationToken>,
    last_failure: Option<FailureReason>,
}

impl Default for TurnStatus {
    fn default() -> Self {
        Self {
            state: TurnState::Idle,
            pending: None,
            cancel: None,
            last_failure: None,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    /// Held for the whole of a turn.
    turn: Mutex<()>,
    status: Mutex<TurnStatus>,
}

impl Slot {
    async fn set_state(&self, state: TurnState) {
        self.status.lock().await.state = state;
    }

    /// Idle and not borrowed by a status reader.
    fn is_idle(&self) -> bool {
        self.status
            .try_lock()
            .map(|status| status.state == TurnState::Idle)
            .unwrap_or(false)
    }

    async fn fail(&self, reason: FailureReason) {
        let mut status = self.status.lock().await;
        status.state = TurnState::Failed;
        status.cancel = None;
        status.last_failure = Some(reason);
    }
}

/// Coordinates the catalog, ledger, store and reply generator into turns.
pub struct SessionOrchestrator {
    catalog: Catalog,
    ledger: SubscriptionLedger,
    store: ConversationStore,
    brain: Arc<dyn Brain>,
    reply_timeout: Duration,
    history_window: usize,
    slots: Mutex<HashMap<ConversationKey, Arc<Slot>>>,
}

impl SessionOrchestrator {
    pub fn new(
        catalog: Catalog,
        ledger: SubscriptionLedger,
        store: ConversationStore,
        brain: Arc<dyn Brain>,
    ) -> Self {
        Self {
            catalog,
            ledger,
            store,
            brain,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            history_window: DEFAULT_HISTORY_WINDOW,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn with_history_window(mut self, messages: usize) -> Self {
        self.history_window = messages;
        self
    }

    pub fn brain_name(&self) -> &str {
        self.brain.name()
    }

    /// Slot for `key`, created on demand.
    ///
    /// Idle slots nobody holds are dropped; failed ones stay so the turn can
    /// be retried.
    async fn slot(&self, key: &ConversationKey) -> Arc<Slot> {
        let mut slots = self.slots.lock().await;
        slots.retain(|_, slot| Arc::strong_count(slot) > 1 || !slot.is_idle());
        slots.entry(key.clone()).or_default().clone()
    }

    /// Give back a slot after a turn, dropping it if it went back to idle.
    async fn release(&self, key: &ConversationKey, slot: Arc<Slot>) {
        drop(slot);
        let mut slots = self.slots.lock().await;
        if slots
            .get(key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1 && slot.is_idle())
        {
            slots.remove(key);
        }
    }

    /// Number of conversations with turn state held in memory.
    pub async fn active_slots(&self) -> usize {
        self.slots.lock().await.len()
    }

    async fn existing_slot(&self, key: &ConversationKey) -> Option<Arc<Slot>> {
        self.slots.lock().await.get(key).cloned()
    }

    /// Send a user message and wait for the agent's reply.
    ///
    /// Fails with `InvalidInput` for blank content and `NotSubscribed`
    /// without an active subscription; nothing is stored in either case.
    /// Generator failures are reported as [`TurnOutcome::Failed`].
    pub async fn submit(
        &self,
        user_id: &str,
        agent_id: AgentId,
        content: &str,
    ) -> Result<TurnOutcome> {
        if content.trim().is_empty() {
            return Err(OrchestratorError::InvalidInput(
                "message content must not be empty".to_string(),
            ));
        }

        let key = ConversationKey::new(user_id, agent_id);
        let slot = self.slot(&key).await;
        let result = self.run_submit(&slot, &key, content).await;
        self.release(&key, slot).await;
        result
    }

    async fn run_submit(
        &self,
        slot: &Slot,
        key: &ConversationKey,
        content: &str,
    ) -> Result<TurnOutcome> {
        let (user_id, agent_id) = (key.user_id.as_str(), key.agent_id);
        let _turn = slot.turn.lock().await;

        let agent = self.catalog.get(agent_id).await?;
        let user_message = {
            let admission = self.ledger.admit(user_id, agent_id).await?;
            slot.set_state(TurnState::Submitting).await;
            match self.store.append(&admission, Sender::User, content).await {
                Ok(message) => message,
                Err(err) => {
                    slot.set_state(TurnState::Idle).await;
                    return Err(err);
                }
            }
        };

        info!(
            conversation = %key,
            seq = user_message.seq,
            "User message stored, awaiting reply"
        );
        self.complete_turn(slot, key, &agent, user_message).await
    }

    /// Generate the reply again for the stored message of a failed turn.
    pub async fn retry(&self, user_id: &str, agent_id: AgentId) -> Result<TurnOutcome> {
        let key = ConversationKey::new(user_id, agent_id);
        let slot = self
            .existing_slot(&key)
            .await
            .ok_or_else(|| no_pending_turn(&key))?;
        let result = self.run_retry(&slot, &key).await;
        self.release(&key, slot).await;
        result
    }

    async fn run_retry(&self, slot: &Slot, key: &ConversationKey) -> Result<TurnOutcome> {
        let _turn = slot.turn.lock().await;

        let user_message = {
            let status = slot.status.lock().await;
            match (&status.state, &status.pending) {
                (TurnState::Failed, Some(pending)) => pending.clone(),
                _ => return Err(no_pending_turn(key)),
            }
        };

        drop(self.ledger.admit(&key.user_id, key.agent_id).await?);
        let agent = self.catalog.get(key.agent_id).await?;

        info!(conversation = %key, seq = user_message.seq, "Retrying reply");
        self.complete_turn(slot, key, &agent, user_message).await
    }

    /// Cancel the reply a conversation is waiting for.
    ///
    /// Only valid while the turn is awaiting its reply. The waiting `submit`
    /// or `retry` returns `Failed(Cancelled)`.
    pub async fn cancel(&self, user_id: &str, agent_id: AgentId) -> Result<()> {
        let key = ConversationKey::new(user_id, agent_id);
        let slot = self
            .existing_slot(&key)
            .await
            .ok_or_else(|| no_pending_turn(&key))?;

        let status = slot.status.lock().await;
        match (&status.state, &status.cancel) {
            (TurnState::AwaitingReply, Some(token)) => {
                token.cancel();
                info!(conversation = %key, "Cancelled pending reply");
                Ok(())
            }
            _ => Err(no_pending_turn(&key)),
        }
    }

    /// Current turn state of a conversation.
    pub async fn turn_state(&self, user_id: &str, agent_id: AgentId) -> TurnSnapshot {
        let key = ConversationKey::new(user_id, agent_id);
        match self.existing_slot(&key).await {
            Some(slot) => {
                let status = slot.status.lock().await;
                TurnSnapshot {
                    state: status.state,
                    pending: status.pending.clone(),
                    last_failure: status.last_failure.clone(),
                }
            }
            None => TurnSnapshot {
                state: TurnState::Idle,
                pending: None,
                last_failure: None,
            },
        }
    }

    /// The greeting shown when a subscribed user opens the conversation.
    pub async fn welcome(&self, user_id: &str, agent_id: AgentId) -> Result<String> {
        if !self.ledger.is_subscribed(user_id, agent_id).await? {
            return Err(OrchestratorError::NotSubscribed {
                user_id: user_id.to_string(),
                agent_id,
            });
        }
        let agent = self.catalog.get(agent_id).await?;
        Ok(sample_greeting(&agent.name, &agent.prompt.welcome))
    }

    /// Run the generator for a stored user message and settle the turn.
    async fn complete_turn(
        &self,
        slot: &Slot,
        key: &ConversationKey,
        agent: &Agent,
        user_message: Message,
    ) -> Result<TurnOutcome> {
        let history = match self.context_before(key, user_message.seq).await {
            Ok(history) => history,
            Err(err) => {
                warn!(
                    conversation = %key,
                    seq = user_message.seq,
                    "Loading context failed: {}",
                    err
                );
                let mut status = slot.status.lock().await;
                status.state = TurnState::Failed;
                status.pending = Some(user_message);
                status.cancel = None;
                status.last_failure = Some(FailureReason::Storage {
                    detail: err.to_string(),
                });
                return Err(err);
            }
        };
        let request = ReplyRequest::new(
            agent.id,
            agent.name.clone(),
            agent.prompt.clone(),
            agent.settings.clone(),
            user_message.content.clone(),
        )
        .with_history(history);

        let token = CancellationToken::new();
        {
            let mut status = slot.status.lock().await;
            status.state = TurnState::AwaitingReply;
            status.pending = Some(user_message.clone());
            status.cancel = Some(token.clone());
            status.last_failure = None;
        }

        let generated = tokio::select! {
            _ = token.cancelled() => Err(FailureReason::Cancelled),
            result = tokio::time::timeout(self.reply_timeout, self.brain.generate(request)) => {
                match result {
                    Ok(Ok(reply)) if reply.content.trim().is_empty() => {
                        Err(FailureReason::from(&BrainError::Provider("empty reply".to_string())))
                    }
                    Ok(Ok(reply)) => Ok(reply),
                    Ok(Err(err)) => Err(FailureReason::from(&err)),
                    Err(_) => Err(FailureReason::from(&BrainError::Timeout)),
                }
            }
        };

        let reply = match generated {
            Ok(reply) => reply,
            Err(reason) => {
                warn!(conversation = %key, seq = user_message.seq, ?reason, "Turn failed");
                slot.fail(reason.clone()).await;
                return Ok(TurnOutcome::Failed {
                    user_message,
                    reason,
                });
            }
        };

        let admission = match self.ledger.admit(&key.user_id, key.agent_id).await {
            Ok(admission) => admission,
            Err(err) => {
                warn!(conversation = %key, "Dropping reply: {}", err);
                let reason = match err {
                    OrchestratorError::NotSubscribed { .. } => FailureReason::Unsubscribed,
                    ref other => FailureReason::Storage {
                        detail: other.to_string(),
                    },
                };
                slot.fail(reason).await;
                return Err(err);
            }
        };

        let agent_message = match self.store.append(&admission, Sender::Agent, &reply.content).await
        {
            Ok(message) => message,
            Err(err) => {
                slot.fail(FailureReason::Storage {
                    detail: err.to_string(),
                })
                .await;
                return Err(err);
            }
        };
        drop(admission);

        {
            let mut status = slot.status.lock().await;
            *status = TurnStatus::default();
        }
        info!(
            conversation = %key,
            seq = agent_message.seq,
            "Reply stored: {} chars",
            agent_message.content.len()
        );

        Ok(TurnOutcome::Settled {
            user_message,
            agent_message,
        })
    }

    /// Messages before `seq`, bounded by the history window.
    async fn context_before(&self, key: &ConversationKey, seq: i64) -> Result<Vec<HistoryMessage>> {
        if self.history_window == 0 {
            return Ok(Vec::new());
        }

        let recent = self
            .store
            .recent(&key.user_id, key.agent_id, self.history_window + 1)
            .await?;
        let mut window = HistoryWindow::new(self.history_window);
        window.extend(
            recent
                .into_iter()
                .filter(|m| m.seq < seq)
                .map(|m| match m.sender {
                    Sender::User => HistoryMessage::user(m.content),
                    Sender::Agent => HistoryMessage::agent(m.content),
                }),
        );
        Ok(window.into_vec())
    }
}

fn no_pending_turn(key: &ConversationKey) -> OrchestratorError {
    OrchestratorError::NoPendingTurn {
        user_id: key.user_id.clone(),
        agent_id: key.agent_id,
    }
}
