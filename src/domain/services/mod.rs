pub mod recommendations;
pub mod session;
pub mod widget_gate;

pub use recommendations::*;
pub use session::*;
pub use widget_gate::*;
