use std::sync::Arc;

use dashmap::DashSet;
use uuid::Uuid;

use crate::{
    block::block_models::BlockRelation,
    error::{AppError, Result},
    message::message_store::MessageStore,
};

/// Evaluates whether a sender may append to a conversation.
///
/// The decision is recomputed on every send attempt, never cached across
/// a session: a block created mid-conversation takes effect on the next
/// send.
#[derive(Clone, Default)]
pub struct BlockGuard {
    relations: Arc<DashSet<BlockRelation>>,
}

impl BlockGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self, blocker: Uuid, blocked: Uuid) {
        self.relations.insert(BlockRelation { blocker, blocked });
        tracing::debug!(%blocker, %blocked, "block relation created");
    }

    /// Remove a block relation; no-op if it does not exist.
    pub fn unblock(&self, blocker: Uuid, blocked: Uuid) {
        self.relations.remove(&BlockRelation { blocker, blocked });
    }

    fn blocked_between(&self, a: Uuid, b: Uuid) -> bool {
        self.relations.contains(&BlockRelation {
            blocker: a,
            blocked: b,
        }) || self.relations.contains(&BlockRelation {
            blocker: b,
            blocked: a,
        })
    }

    /// True iff `sender_id` is a participant of the conversation and no
    /// block relation exists between the two participants in either
    /// direction.
    pub fn can_send(&self, sender_id: Uuid, store: &MessageStore, conversation_id: Uuid) -> bool {
        let Ok([a, b]) = store.participants(conversation_id) else {
            return false;
        };
        if sender_id != a && sender_id != b {
            return false;
        }
        !self.blocked_between(a, b)
    }

    /// Same check as [`can_send`](Self::can_send) but with distinct
    /// failure kinds, for the append path.
    pub fn ensure_can_send(
        &self,
        sender_id: Uuid,
        store: &MessageStore,
        conversation_id: Uuid,
    ) -> Result<()> {
        let [a, b] = store.participants(conversation_id)?;
        if sender_id != a && sender_id != b {
            return Err(AppError::NotParticipant);
        }
        if self.blocked_between(a, b) {
            return Err(AppError::Blocked);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "block_guard_test.rs"]
mod block_guard_test;
