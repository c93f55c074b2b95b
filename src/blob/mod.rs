pub mod blob_handlers;
pub mod blob_store;
