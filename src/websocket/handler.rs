use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    message::message_dto::SendMessageRequest,
    message::message_models::MessageResponse,
    state::AppState,
    websocket::broker::FrameSender,
    websocket::types::{BacklogPayload, ClientFrame, ErrorPayload, ServerFrame, SummaryBacklogPayload},
};

/// Live-subscription WebSocket endpoint.
///
/// A client opens one socket, then subscribes to conversations and/or a
/// user's conversation index with JSON frames. Sends can also be issued
/// over the socket; they run through the same service path as the REST
/// endpoint.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let subscriber_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerFrame>(state.config.subscriber_buffer);

    // Task: forward frames from the broker channel to the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&frame) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Task: process frames arriving from the client.
    let state_clone = state.clone();
    let tx_clone = tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Err(e) =
                    process_client_frame(&text, subscriber_id, &state_clone, &tx_clone).await
                {
                    tracing::debug!(%subscriber_id, "client frame rejected: {e}");
                    let _ = tx_clone
                        .send(ServerFrame::Error(ErrorPayload {
                            code: e.code().to_string(),
                            message: e.to_string(),
                        }))
                        .await;
                }
            } else if let Message::Close(_) = msg {
                break;
            }
        }
    });

    // Heartbeat task
    let tx_heartbeat = tx.clone();
    let mut heartbeat_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
        loop {
            interval.tick().await;
            if tx_heartbeat.send(ServerFrame::Ping).await.is_err() {
                break;
            }
        }
    });

    // Stop all tasks when any one finishes
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            heartbeat_task.abort();
        },
        _ = &mut recv_task => {
            send_task.abort();
            heartbeat_task.abort();
        },
        _ = &mut heartbeat_task => {
            send_task.abort();
            recv_task.abort();
        }
    }

    state.broker.unsubscribe(subscriber_id);
    tracing::info!(%subscriber_id, "subscription socket closed");
}

async fn process_client_frame(
    text: &str,
    subscriber_id: Uuid,
    state: &AppState,
    tx: &FrameSender,
) -> Result<()> {
    let frame: ClientFrame = serde_json::from_str(text)
        .map_err(|e| AppError::BadRequest(format!("Invalid frame format: {}", e)))?;

    match frame {
        ClientFrame::SubscribeConversation {
            conversation_id,
            last_known_message_id,
        } => {
            // Register for live frames first, then pull the backlog, so
            // nothing appended in between is missed. The overlap this can
            // produce is harmless: clients de-duplicate by message id.
            state
                .broker
                .subscribe_conversation(conversation_id, subscriber_id, tx.clone());

            let backlog = match state
                .message_service
                .history_since(conversation_id, last_known_message_id)
                .await
            {
                Ok(messages) => messages,
                Err(e) => {
                    state.broker.unsubscribe(subscriber_id);
                    return Err(e);
                }
            };

            let _ = tx
                .send(ServerFrame::Backlog(BacklogPayload {
                    conversation_id,
                    messages: backlog.into_iter().map(MessageResponse::from).collect(),
                }))
                .await;
        }

        ClientFrame::SubscribeIndex { user_id } => {
            state
                .broker
                .subscribe_index(user_id, subscriber_id, tx.clone());

            let summaries = state.conversation_index.list_for(user_id);
            let _ = tx
                .send(ServerFrame::SummaryBacklog(SummaryBacklogPayload {
                    user_id,
                    summaries,
                }))
                .await;
        }

        ClientFrame::SendMessage {
            conversation_id,
            sender_id,
            text,
            attachment,
        } => {
            state
                .message_service
                .send_message(SendMessageRequest {
                    conversation_id,
                    sender_id,
                    text,
                    attachment,
                })
                .await?;
        }

        ClientFrame::MarkSeen {
            user_id,
            conversation_id,
        } => {
            state.message_service.mark_seen(user_id, conversation_id)?;
        }

        ClientFrame::Ping => {
            let _ = tx.send(ServerFrame::Pong).await;
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "handler_test.rs"]
mod handler_test;
