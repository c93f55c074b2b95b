use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    conversation::conversation_models::ConversationSummary,
    message::message_models::{Attachment, MessageResponse},
};

/// Server-to-client frames.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Catch-up history sent once, immediately after a conversation
    /// subscription is accepted.
    Backlog(BacklogPayload),
    /// A message newly appended to a subscribed conversation. Delivered
    /// at least once; clients de-duplicate by message id.
    MessageAppended(MessageResponse),
    /// Current summary rows sent once, immediately after an index
    /// subscription is accepted.
    SummaryBacklog(SummaryBacklogPayload),
    /// A summary row of a subscribed user changed.
    SummaryUpdated(ConversationSummary),
    Error(ErrorPayload),
    Ping,
    Pong,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BacklogPayload {
    pub conversation_id: Uuid,
    pub messages: Vec<MessageResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SummaryBacklogPayload {
    pub user_id: Uuid,
    pub summaries: Vec<ConversationSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

// Client-to-server frames
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    SubscribeConversation {
        conversation_id: Uuid,
        last_known_message_id: Option<Uuid>,
    },
    SubscribeIndex {
        user_id: Uuid,
    },
    SendMessage {
        conversation_id: Uuid,
        sender_id: Uuid,
        #[serde(default)]
        text: String,
        attachment: Option<Attachment>,
    },
    MarkSeen {
        user_id: Uuid,
        conversation_id: Uuid,
    },
    Ping,
}
