use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::message::message_models::Attachment;

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct SendMessageRequest {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    /// May be empty when an attachment is present.
    #[validate(length(max = 4096))]
    #[serde(default)]
    pub text: String,
    pub attachment: Option<Attachment>,
}
