#![allow(unused_imports, dead_code)]
pub mod app_helpers;
pub mod test_db;

pub use app_helpers::*;
pub use test_db::*;
