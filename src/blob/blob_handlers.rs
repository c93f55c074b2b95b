use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::{error::Result, message::message_models::Attachment, state::AppState};

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Original file name; only its extension is kept.
    file_name: String,
}

/// Upload a file, receiving back an attachment reference
#[utoipa::path(
    post,
    path = "/api/uploads",
    tag = "uploads",
    params(
        ("file_name" = String, Query, description = "Original file name")
    ),
    request_body(content = Vec<u8>, description = "Raw file bytes", content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "File stored", body = Attachment),
        (status = 400, description = "Empty upload"),
        (status = 503, description = "Storage temporarily unavailable")
    )
)]
pub async fn upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let attachment = state.blob_store.store(&query.file_name, &body).await?;

    Ok((StatusCode::CREATED, Json(attachment)))
}
