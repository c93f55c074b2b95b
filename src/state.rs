use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::{
    blob::blob_store::BlobStore,
    block::block_guard::BlockGuard,
    conversation::conversation_index::ConversationIndex,
    message::message_service::MessageService,
    message::message_store::MessageStore,
    websocket::broker::SubscriptionBroker,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub message_store: MessageStore,
    pub conversation_index: ConversationIndex,
    pub block_guard: BlockGuard,
    pub broker: SubscriptionBroker,
    pub message_service: MessageService,
    pub blob_store: BlobStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let message_store = MessageStore::new();
        let conversation_index = ConversationIndex::new();
        let block_guard = BlockGuard::new();
        let broker = SubscriptionBroker::new(config.delivery_timeout);
        let message_service = MessageService::new(
            message_store.clone(),
            conversation_index.clone(),
            block_guard.clone(),
            broker.clone(),
        );
        let blob_store = BlobStore::new(config.upload_dir.clone());

        Self {
            config,
            message_store,
            conversation_index,
            block_guard,
            broker,
            message_service,
            blob_store,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    /// Bounded retry window for broker deliveries to a slow subscriber.
    pub delivery_timeout: Duration,
    /// Capacity of each subscriber's outbound frame channel.
    pub subscriber_buffer: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            delivery_timeout: Duration::from_millis(
                std::env::var("DELIVERY_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(2_000),
            ),
            subscriber_buffer: std::env::var("SUBSCRIBER_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            upload_dir: PathBuf::from("uploads"),
            delivery_timeout: Duration::from_millis(2_000),
            subscriber_buffer: 256,
        }
    }
}
