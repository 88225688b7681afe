pub mod agent_repository;
pub mod chat_provider;
pub mod ticket_repository;
pub mod user_repository;
