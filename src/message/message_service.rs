use uuid::Uuid;
use validator::Validate;

use crate::{
    block::block_guard::BlockGuard,
    conversation::conversation_index::ConversationIndex,
    conversation::conversation_models::Conversation,
    error::Result,
    message::message_dto::SendMessageRequest,
    message::message_models::Message,
    message::message_store::MessageStore,
    websocket::broker::SubscriptionBroker,
};

/// Orchestrates the send path: permission check, append, index update,
/// then fan-out. The append and both index rows are applied before any
/// subscriber can observe the message, so a rejected or failed send is
/// never partially visible.
#[derive(Clone)]
pub struct MessageService {
    store: MessageStore,
    index: ConversationIndex,
    guard: BlockGuard,
    broker: SubscriptionBroker,
}

impl MessageService {
    pub fn new(
        store: MessageStore,
        index: ConversationIndex,
        guard: BlockGuard,
        broker: SubscriptionBroker,
    ) -> Self {
        Self {
            store,
            index,
            guard,
            broker,
        }
    }

    /// Open a conversation between two users, creating both participants'
    /// summary rows alongside it.
    pub fn open_conversation(
        &self,
        participant_a: Uuid,
        participant_b: Uuid,
    ) -> Result<Conversation> {
        let conversation = self.store.open(participant_a, participant_b)?;
        self.index.create_rows(&conversation);
        Ok(conversation)
    }

    /// Append a message and update both summary rows, then push to live
    /// subscribers. Returns the stored message.
    ///
    /// The block check runs on every attempt; a block created
    /// mid-conversation rejects the next send.
    pub async fn send_message(&self, payload: SendMessageRequest) -> Result<Message> {
        payload.validate()?;
        self.guard
            .ensure_can_send(payload.sender_id, &self.store, payload.conversation_id)?;

        let participants = self.store.participants(payload.conversation_id)?;

        // Index update and fan-out run under the conversation lock, so
        // every subscriber observes same-conversation messages in append
        // order. Both stay off the slow path: the index is a map write
        // and broker delivery is a non-blocking try_send.
        let message = self
            .store
            .append_with(
                payload.conversation_id,
                payload.sender_id,
                &payload.text,
                payload.attachment,
                |message| {
                    let summaries = self.index.on_message_appended(message, participants);
                    self.broker.publish_message(message);
                    for summary in &summaries {
                        self.broker.publish_summary(summary);
                    }
                },
            )
            .await?;

        tracing::debug!(
            message_id = %message.id,
            conversation_id = %message.conversation_id,
            seq = message.seq,
            "message appended"
        );

        Ok(message)
    }

    /// Full history of a conversation, oldest first.
    pub async fn history(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        self.store.read(conversation_id).await
    }

    /// Messages after `last_known_id`, for reconnect catch-up.
    pub async fn history_since(
        &self,
        conversation_id: Uuid,
        last_known_id: Option<Uuid>,
    ) -> Result<Vec<Message>> {
        self.store.read_since(conversation_id, last_known_id).await
    }

    /// Acknowledge a conversation for one user and notify that user's
    /// index subscribers if the flag flipped.
    pub fn mark_seen(&self, user_id: Uuid, conversation_id: Uuid) -> Result<()> {
        if let Some(summary) = self.index.mark_seen(user_id, conversation_id)? {
            self.broker.publish_summary(&summary);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "message_service_test.rs"]
mod message_service_test;
