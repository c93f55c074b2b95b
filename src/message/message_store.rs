use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    conversation::conversation_models::Conversation,
    error::{AppError, Result},
    message::message_models::{Attachment, Message},
};

/// One conversation: an immutable participant pair plus an append-only
/// log. The log is guarded by a per-conversation mutex so that timestamp
/// and sequence assignment are serialized relative to concurrent appends
/// on the same conversation.
struct ConversationEntry {
    participants: [Uuid; 2],
    log: Mutex<Vec<Message>>,
}

/// In-process message store: one append-only log per conversation.
///
/// Appends to different conversations share no lock; the only
/// serialization point is the mutex of the conversation being written.
#[derive(Clone, Default)]
pub struct MessageStore {
    conversations: Arc<DashMap<Uuid, Arc<ConversationEntry>>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new conversation between two users and return it.
    pub fn open(&self, participant_a: Uuid, participant_b: Uuid) -> Result<Conversation> {
        if participant_a == participant_b {
            return Err(AppError::BadRequest(
                "a conversation needs two distinct participants".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        self.conversations.insert(
            id,
            Arc::new(ConversationEntry {
                participants: [participant_a, participant_b],
                log: Mutex::new(Vec::new()),
            }),
        );

        tracing::debug!(conversation_id = %id, "conversation opened");

        Ok(Conversation {
            id,
            participants: [participant_a, participant_b],
        })
    }

    fn entry(&self, conversation_id: Uuid) -> Result<Arc<ConversationEntry>> {
        self.conversations
            .get(&conversation_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))
    }

    /// The two participants of a conversation.
    pub fn participants(&self, conversation_id: Uuid) -> Result<[Uuid; 2]> {
        Ok(self.entry(conversation_id)?.participants)
    }

    /// Append a message at the tail of the conversation's log.
    ///
    /// The server assigns identifier, sequence number and creation
    /// timestamp under the conversation lock. The timestamp never goes
    /// backwards within a conversation; equal timestamps are ordered by
    /// sequence number.
    pub async fn append(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        text: &str,
        attachment: Option<Attachment>,
    ) -> Result<Message> {
        self.append_with(conversation_id, sender_id, text, attachment, |_| {})
            .await
    }

    /// Append a message and run `on_append` with the stored message
    /// before the conversation lock is released.
    ///
    /// Observers wired through the hook therefore see same-conversation
    /// appends in log order; without it, two appends could release the
    /// lock and race to their observers in either order. The hook runs
    /// on the append path and must not block.
    pub async fn append_with<F>(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        text: &str,
        attachment: Option<Attachment>,
        on_append: F,
    ) -> Result<Message>
    where
        F: FnOnce(&Message),
    {
        let entry = self.entry(conversation_id)?;

        if !entry.participants.contains(&sender_id) {
            return Err(AppError::NotParticipant);
        }
        if text.is_empty() && attachment.is_none() {
            return Err(AppError::EmptyPayload);
        }

        let mut log = entry.log.lock().await;

        let now = Utc::now();
        let created_at = match log.last() {
            Some(prev) if prev.created_at > now => prev.created_at,
            _ => now,
        };

        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            text: text.to_string(),
            attachment,
            seq: log.len() as u64 + 1,
            created_at,
        };
        log.push(message.clone());
        on_append(&message);

        Ok(message)
    }

    /// Full history, oldest first.
    pub async fn read(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        let entry = self.entry(conversation_id)?;
        let log = entry.log.lock().await;
        Ok(log.clone())
    }

    /// Messages strictly after `last_known_id`, oldest first.
    ///
    /// An unknown or absent identifier yields the full history; clients
    /// de-duplicate by message id, so over-delivery is safe while
    /// under-delivery is not.
    pub async fn read_since(
        &self,
        conversation_id: Uuid,
        last_known_id: Option<Uuid>,
    ) -> Result<Vec<Message>> {
        let entry = self.entry(conversation_id)?;
        let log = entry.log.lock().await;

        let start = last_known_id
            .and_then(|id| log.iter().position(|m| m.id == id))
            .map_or(0, |pos| pos + 1);

        Ok(log[start..].to_vec())
    }

    /// Number of stored messages in a conversation.
    #[allow(dead_code)]
    pub async fn message_count(&self, conversation_id: Uuid) -> Result<usize> {
        let entry = self.entry(conversation_id)?;
        let log = entry.log.lock().await;
        Ok(log.len())
    }
}

#[cfg(test)]
#[path = "message_store_test.rs"]
mod message_store_test;
