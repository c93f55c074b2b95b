use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Conversation {
    pub id: Uuid,
    /// Exactly two members; a conversation is always one-to-one.
    #[schema(value_type = Vec<Uuid>)]
    pub participants: [Uuid; 2],
}

/// One row per (user, conversation) pair: what that user's conversation
/// list shows for this conversation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationSummary {
    pub conversation_id: Uuid,
    /// Owner of this row.
    pub user_id: Uuid,
    /// The other participant.
    pub peer_id: Uuid,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    /// True when the owner sent the last message or has explicitly
    /// acknowledged it.
    pub seen: bool,
}
