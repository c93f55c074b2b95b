use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::Result,
    message::{message_dto::SendMessageRequest, message_models::MessageResponse},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Return only messages after this id (reconnect catch-up).
    since: Option<Uuid>,
}

/// Send a message into a conversation
#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = MessageResponse),
        (status = 400, description = "Empty payload or invalid input"),
        (status = 403, description = "Sender is blocked or not a participant"),
        (status = 404, description = "Conversation not found")
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl IntoResponse> {
    let message = state.message_service.send_message(payload).await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

/// Get a conversation's messages, oldest first
#[utoipa::path(
    get,
    path = "/api/messages/{conversation_id}",
    tag = "messages",
    params(
        ("conversation_id" = Uuid, Path, description = "Conversation to read"),
        ("since" = Option<Uuid>, Query, description = "Only messages after this message id")
    ),
    responses(
        (status = 200, description = "Ordered messages", body = Vec<MessageResponse>),
        (status = 404, description = "Conversation not found")
    )
)]
pub async fn get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse> {
    let messages = match query.since {
        Some(_) => {
            state
                .message_service
                .history_since(conversation_id, query.since)
                .await?
        }
        None => state.message_service.history(conversation_id).await?,
    };

    let responses: Vec<MessageResponse> = messages.into_iter().map(MessageResponse::from).collect();

    Ok((StatusCode::OK, Json(responses)))
}
