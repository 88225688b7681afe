pub mod auth;
pub mod error;
pub mod json;

pub use auth::*;
pub use error::*;
pub use json::*;
