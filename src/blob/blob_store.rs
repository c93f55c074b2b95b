use std::path::PathBuf;

use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    message::message_models::{Attachment, AttachmentKind},
};

/// Filesystem-backed blob store. Accepts a file, writes it under the
/// upload root with a fresh name, and returns a durable URL. The chat
/// core treats that URL as an opaque attachment reference.
#[derive(Clone)]
pub struct BlobStore {
    root: PathBuf,
    /// Public path prefix the stored files are served under.
    base_url: String,
}

impl BlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            base_url: "/uploads".to_string(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Persist `bytes` and return the attachment reference. IO failures
    /// surface as transient store errors; callers may retry.
    pub async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<Attachment> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("uploaded file is empty".to_string()));
        }

        let extension = sanitized_extension(file_name);
        let stored_name = match &extension {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&stored_name), bytes).await?;

        let kind = match extension.as_deref() {
            Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "svg") => AttachmentKind::Image,
            _ => AttachmentKind::File,
        };

        tracing::debug!(stored_name, "blob stored");

        Ok(Attachment {
            url: format!("{}/{}", self.base_url, stored_name),
            kind,
        })
    }
}

/// Lowercased extension, restricted to short alphanumeric suffixes so a
/// client-supplied name cannot smuggle path components into the store.
fn sanitized_extension(file_name: &str) -> Option<String> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

#[cfg(test)]
#[path = "blob_store_test.rs"]
mod blob_store_test;
