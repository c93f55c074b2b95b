use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{block::block_models::BlockRelation, error::Result, state::AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct CanSendResponse {
    pub can_send: bool,
}

/// Block a user
#[utoipa::path(
    post,
    path = "/api/blocks",
    tag = "blocks",
    request_body = BlockRelation,
    responses(
        (status = 201, description = "Block relation created")
    )
)]
pub async fn create_block(
    State(state): State<AppState>,
    Json(payload): Json<BlockRelation>,
) -> Result<impl IntoResponse> {
    state.block_guard.block(payload.blocker, payload.blocked);

    Ok(StatusCode::CREATED)
}

/// Unblock a user
#[utoipa::path(
    delete,
    path = "/api/blocks",
    tag = "blocks",
    request_body = BlockRelation,
    responses(
        (status = 204, description = "Block relation removed (or never existed)")
    )
)]
pub async fn delete_block(
    State(state): State<AppState>,
    Json(payload): Json<BlockRelation>,
) -> Result<impl IntoResponse> {
    state.block_guard.unblock(payload.blocker, payload.blocked);

    Ok(StatusCode::NO_CONTENT)
}

/// Check whether a user may currently send into a conversation
///
/// Recomputed per call, so a UI can disable its input as soon as a block
/// lands.
#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_id}/can-send/{sender_id}",
    tag = "blocks",
    params(
        ("conversation_id" = Uuid, Path, description = "Conversation to send into"),
        ("sender_id" = Uuid, Path, description = "Prospective sender")
    ),
    responses(
        (status = 200, description = "Current permission", body = CanSendResponse)
    )
)]
pub async fn can_send(
    State(state): State<AppState>,
    Path((conversation_id, sender_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let can_send = state
        .block_guard
        .can_send(sender_id, &state.message_store, conversation_id);

    Ok((StatusCode::OK, Json(CanSendResponse { can_send })))
}
