//! Append-only conversation log and its read projections.

use chrono::Utc;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};

use crate::error::{OrchestratorError, Result};
use crate::ledger::Admission;
use crate::model::{format_timestamp, AgentId, ConversationKey, Message, Sender};
use crate::repository::SharedBackend;

/// Messages fetched per round trip when streaming history.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Separator between export records.
pub const EXPORT_SEPARATOR: &str = "\n\n";

/// Per-conversation message log.
///
/// Writes require an [`Admission`] from the ledger. Reads do not, so a
/// conversation stays readable and exportable after unsubscribing.
#[derive(Clone)]
pub struct ConversationStore {
    backend: SharedBackend,
    page_size: usize,
}

impl ConversationStore {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set how many messages history streams fetch at a time.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Append a message to the admitted conversation.
    pub async fn append(
        &self,
        admission: &Admission,
        sender: Sender,
        content: &str,
    ) -> Result<Message> {
        self.backend
            .append_message(admission.key(), sender, content, Utc::now())
            .await
    }

    /// Full history of a conversation, oldest first.
    pub fn history(&self, user_id: &str, agent_id: AgentId) -> History {
        History {
            backend: self.backend.clone(),
            key: ConversationKey::new(user_id, agent_id),
            page_size: self.page_size,
        }
    }

    /// The latest `limit` messages, oldest first.
    pub async fn recent(
        &self,
        user_id: &str,
        agent_id: AgentId,
        limit: usize,
    ) -> Result<Vec<Message>> {
        let key = ConversationKey::new(user_id, agent_id);
        self.backend.recent_messages(&key, limit).await
    }

    pub async fn count(&self, user_id: &str, agent_id: AgentId) -> Result<i64> {
        let key = ConversationKey::new(user_id, agent_id);
        self.backend.message_count(&key).await
    }

    /// Text export of a conversation as a stream of UTF-8 chunks.
    ///
    /// One `[timestamp] sender: content` record per message, records
    /// separated by a blank line.
    pub fn export(&self, user_id: &str, agent_id: AgentId) -> BoxStream<'static, Result<String>> {
        self.history(user_id, agent_id)
            .stream()
            .enumerate()
            .map(|(index, message)| {
                message.map(|m| {
                    if index == 0 {
                        format_record(&m)
                    } else {
                        format!("{}{}", EXPORT_SEPARATOR, format_record(&m))
                    }
                })
            })
            .boxed()
    }

    /// The whole export as bytes.
    pub async fn export_bytes(&self, user_id: &str, agent_id: AgentId) -> Result<Vec<u8>> {
        let text = self
            .export(user_id, agent_id)
            .try_fold(String::new(), |mut acc, chunk| async move {
                acc.push_str(&chunk);
                Ok(acc)
            })
            .await?;
        Ok(text.into_bytes())
    }
}

/// One export record.
pub fn format_record(message: &Message) -> String {
    format!(
        "[{}] {}: {}",
        format_timestamp(&message.timestamp),
        message.sender,
        message.content
    )
}

/// A restartable view of one conversation's history.
///
/// Each call to [`History::stream`] starts from the first message and pages
/// through storage lazily. A stream ends at the message count observed when
/// it started, so messages appended while it runs are not included.
#[derive(Clone)]
pub struct History {
    backend: SharedBackend,
    key: ConversationKey,
    page_size: usize,
}

impl History {
    pub fn key(&self) -> &ConversationKey {
        &self.key
    }

    /// Stream the history from the beginning.
    pub fn stream(&self) -> impl Stream<Item = Result<Message>> + Send + 'static {
        let backend = self.backend.clone();
        let key = self.key.clone();
        let page_size = self.page_size;

        // State: (last seq yielded, seq to stop at once known)
        stream::try_unfold((0_i64, None::<i64>), move |(after_seq, end)| {
            let backend = backend.clone();
            let key = key.clone();
            async move {
                next_page(&backend, &key, page_size, after_seq, end)
                    .await
                    .map(|page| {
                        page.map(|(messages, state)| {
                            let items = messages.into_iter().map(Ok::<_, OrchestratorError>);
                            (stream::iter(items), state)
                        })
                    })
            }
        })
        .try_flatten()
    }

    /// Collect the whole history.
    pub async fn collect(&self) -> Result<Vec<Message>> {
        self.stream().try_collect().await
    }
}

type Page = (Vec<Message>, (i64, Option<i64>));

async fn next_page(
    backend: &SharedBackend,
    key: &ConversationKey,
    page_size: usize,
    after_seq: i64,
    end: Option<i64>,
) -> Result<Option<Page>> {
    let end = match end {
        Some(end) => end,
        None => backend.message_count(key).await?,
    };
    if after_seq >= end {
        return Ok(None);
    }

    let mut page = backend.message_page(key, after_seq, page_size).await?;
    page.retain(|m| m.seq <= end);
    let Some(last_seq) = page.last().map(|m| m.seq) else {
        return Ok(None);
    };
    Ok(Some((page, (last_seq, Some(end)))))
}
