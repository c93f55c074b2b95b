use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    conversation::conversation_models::{Conversation, ConversationSummary},
    error::{AppError, Result},
    message::message_models::Message,
};

struct SummaryRow {
    summary: ConversationSummary,
    /// Sequence number of the message this row reflects. 0 until the
    /// first append. Drives last-writer-wins and replay de-duplication.
    last_seq: u64,
}

/// Per-user conversation summary table, kept consistent with the message
/// store. Rows are updated with last-writer-wins by server-assigned
/// `(created_at, seq)` order, never by arrival order, so a late-arriving
/// update for an earlier message can never clobber a newer one.
#[derive(Clone, Default)]
pub struct ConversationIndex {
    rows: Arc<DashMap<(Uuid, Uuid), SummaryRow>>,
}

impl ConversationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create both participants' rows for a freshly opened conversation.
    pub fn create_rows(&self, conversation: &Conversation) {
        let [a, b] = conversation.participants;
        for (owner, peer) in [(a, b), (b, a)] {
            self.rows.insert(
                (owner, conversation.id),
                SummaryRow {
                    summary: ConversationSummary {
                        conversation_id: conversation.id,
                        user_id: owner,
                        peer_id: peer,
                        last_message: String::new(),
                        last_message_at: chrono::Utc::now(),
                        seen: true,
                    },
                    last_seq: 0,
                },
            );
        }
    }

    /// Apply one appended message to both participants' rows.
    ///
    /// Idempotent: replaying a message already reflected (same or older
    /// sequence number) leaves the rows untouched. Returns the rows that
    /// actually changed, for fan-out to index subscribers.
    pub fn on_message_appended(
        &self,
        message: &Message,
        participants: [Uuid; 2],
    ) -> Vec<ConversationSummary> {
        let [a, b] = participants;
        let mut changed = Vec::with_capacity(2);

        for (owner, peer) in [(a, b), (b, a)] {
            let mut row = self
                .rows
                .entry((owner, message.conversation_id))
                .or_insert_with(|| SummaryRow {
                    summary: ConversationSummary {
                        conversation_id: message.conversation_id,
                        user_id: owner,
                        peer_id: peer,
                        last_message: String::new(),
                        last_message_at: message.created_at,
                        seen: true,
                    },
                    last_seq: 0,
                });

            if message.seq <= row.last_seq {
                // Replay or an older message losing the write race.
                continue;
            }

            row.summary.last_message = message.text.clone();
            row.summary.last_message_at = message.created_at;
            row.summary.seen = owner == message.sender_id;
            row.last_seq = message.seq;
            changed.push(row.summary.clone());
        }

        changed
    }

    /// Acknowledge the latest message: sets the seen flag only, leaving
    /// the last-message fields alone. Idempotent. Returns the row if the
    /// flag actually flipped.
    pub fn mark_seen(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Option<ConversationSummary>> {
        let mut row = self
            .rows
            .get_mut(&(user_id, conversation_id))
            .ok_or_else(|| AppError::NotFound("Conversation summary not found".to_string()))?;

        if row.summary.seen {
            return Ok(None);
        }
        row.summary.seen = true;
        Ok(Some(row.summary.clone()))
    }

    /// All summary rows owned by a user, most recently updated first.
    pub fn list_for(&self, user_id: Uuid) -> Vec<ConversationSummary> {
        let mut summaries: Vec<ConversationSummary> = self
            .rows
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.value().summary.clone())
            .collect();

        summaries.sort_by(|x, y| y.last_message_at.cmp(&x.last_message_at));
        summaries
    }

    /// A single user's row for one conversation.
    #[allow(dead_code)]
    pub fn get(&self, user_id: Uuid, conversation_id: Uuid) -> Option<ConversationSummary> {
        self.rows
            .get(&(user_id, conversation_id))
            .map(|row| row.summary.clone())
    }
}

#[cfg(test)]
#[path = "conversation_index_test.rs"]
mod conversation_index_test;
