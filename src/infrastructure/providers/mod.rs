pub mod lyzr;

pub use lyzr::*;
