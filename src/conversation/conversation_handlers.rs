use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    conversation::conversation_models::{Conversation, ConversationSummary},
    error::Result,
    state::AppState,
};

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct OpenConversationRequest {
    pub participant_a: Uuid,
    pub participant_b: Uuid,
}

/// Open a conversation between two users
#[utoipa::path(
    post,
    path = "/api/conversations",
    tag = "conversations",
    request_body = OpenConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = Conversation),
        (status = 400, description = "Participants are not two distinct users")
    )
)]
pub async fn open_conversation(
    State(state): State<AppState>,
    Json(payload): Json<OpenConversationRequest>,
) -> Result<impl IntoResponse> {
    let conversation: Conversation = state
        .message_service
        .open_conversation(payload.participant_a, payload.participant_b)?;

    Ok((StatusCode::CREATED, Json(conversation)))
}

/// List a user's conversation summaries, newest first
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/conversations",
    tag = "conversations",
    params(
        ("user_id" = Uuid, Path, description = "Owner of the summary rows")
    ),
    responses(
        (status = 200, description = "Summary rows ordered by last update", body = Vec<ConversationSummary>)
    )
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let summaries: Vec<ConversationSummary> = state.conversation_index.list_for(user_id);

    Ok((StatusCode::OK, Json(summaries)))
}

/// Mark a conversation as seen for one user
#[utoipa::path(
    patch,
    path = "/api/conversations/{conversation_id}/seen/{user_id}",
    tag = "conversations",
    params(
        ("conversation_id" = Uuid, Path, description = "Conversation to acknowledge"),
        ("user_id" = Uuid, Path, description = "User acknowledging it")
    ),
    responses(
        (status = 200, description = "Seen flag set"),
        (status = 404, description = "Summary row not found")
    )
)]
pub async fn mark_seen(
    State(state): State<AppState>,
    Path((conversation_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    state.message_service.mark_seen(user_id, conversation_id)?;

    Ok(StatusCode::OK)
}
