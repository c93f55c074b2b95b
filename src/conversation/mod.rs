pub mod conversation_handlers;
pub mod conversation_index;
pub mod conversation_models;
