use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::{Any, CorsLayer}, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blob::blob_handlers,
    block::{block_handlers, block_handlers::CanSendResponse, block_models::BlockRelation},
    conversation::{
        conversation_handlers,
        conversation_handlers::OpenConversationRequest,
        conversation_models::{Conversation, ConversationSummary},
    },
    message::{
        message_dto::SendMessageRequest,
        message_handlers,
        message_models::{Attachment, AttachmentKind, Message, MessageResponse},
    },
    state::AppState,
    websocket,
    websocket::types::{
        BacklogPayload, ErrorPayload, ServerFrame, SummaryBacklogPayload,
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::message::message_handlers::send_message,
        crate::message::message_handlers::get_messages,
        crate::conversation::conversation_handlers::open_conversation,
        crate::conversation::conversation_handlers::list_conversations,
        crate::conversation::conversation_handlers::mark_seen,
        crate::block::block_handlers::create_block,
        crate::block::block_handlers::delete_block,
        crate::block::block_handlers::can_send,
        crate::blob::blob_handlers::upload,
    ),
    components(
        schemas(
            SendMessageRequest,
            OpenConversationRequest,
            Conversation,
            ConversationSummary,
            BlockRelation,
            CanSendResponse,
            Message,
            MessageResponse,
            Attachment,
            AttachmentKind,
            ServerFrame,
            BacklogPayload,
            SummaryBacklogPayload,
            ErrorPayload,
        )
    ),
    tags(
        (name = "messages", description = "Message append and history endpoints"),
        (name = "conversations", description = "Conversation lifecycle and summary endpoints"),
        (name = "blocks", description = "Block relation management"),
        (name = "uploads", description = "Blob store collaborator")
    )
)]
struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    let message_routes = Router::new()
        .route("/", post(message_handlers::send_message))
        .route("/:conversation_id", get(message_handlers::get_messages));

    let conversation_routes = Router::new()
        .route("/", post(conversation_handlers::open_conversation))
        .route(
            "/:conversation_id/seen/:user_id",
            patch(conversation_handlers::mark_seen),
        )
        .route(
            "/:conversation_id/can-send/:sender_id",
            get(block_handlers::can_send),
        );

    let block_routes = Router::new().route(
        "/",
        post(block_handlers::create_block).delete(block_handlers::delete_block),
    );

    let api_routes = Router::new()
        .nest("/messages", message_routes)
        .nest("/conversations", conversation_routes)
        .route(
            "/users/:user_id/conversations",
            get(conversation_handlers::list_conversations),
        )
        .nest("/blocks", block_routes)
        .route("/uploads", post(blob_handlers::upload))
        .route("/ws", get(websocket::ws_handler));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(state.blob_store.root()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;
