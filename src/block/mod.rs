pub mod block_guard;
pub mod block_handlers;
pub mod block_models;
