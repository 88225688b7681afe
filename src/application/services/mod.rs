pub mod agent_service;
pub mod api_key_service;
pub mod chat_service;
pub mod optimization_service;
pub mod ticket_service;
pub mod user_service;
pub mod widget_service;

pub use agent_service::*;
pub use chat_service::*;
pub use optimization_service::*;
pub use ticket_service::*;
pub use user_service::*;
pub use widget_service::*;
