pub mod agents;
pub mod chat;
pub mod health;
pub mod optimization;
pub mod tickets;
pub mod users;
pub mod widget;
