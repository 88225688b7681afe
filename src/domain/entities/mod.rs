pub mod agent;
pub mod chat;
pub mod ticket;
pub mod user;
pub mod widget;

pub use agent::*;
pub use chat::*;
pub use ticket::*;
pub use user::*;
pub use widget::*;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMetadata {
    /// Items on this page
    pub count: i64,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
}

impl PaginationMetadata {
    pub fn new(count: usize, total: i64, page: i64, limit: i64) -> Self {
        let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            count: count as i64,
            total,
            pages,
            current_page: page,
        }
    }
}

/// Clamp `page`/`limit` query values and derive the row offset.
pub fn page_window(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> (i64, i64, i64) {
    let page = page.filter(|p| *p >= 1).unwrap_or(1);
    let limit = match limit {
        Some(l) if l >= 1 => l.min(100),
        _ => default_limit,
    };
    (page, limit, (page - 1) * limit)
}

/// One bucket of a group-by count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCount {
    pub key: Option<String>,
    pub count: i64,
}
