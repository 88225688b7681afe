/// Utility modules
pub mod clock;
pub mod email_validator;
pub mod html;
pub mod validation;

pub use clock::*;
pub use email_validator::*;
pub use html::*;
pub use validation::*;
