pub mod message_dto;
pub mod message_handlers;
pub mod message_models;
pub mod message_service;
pub mod message_store;
