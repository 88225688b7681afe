use axum::Json;
use serde_json::{json, Value};

use crate::shared::utils::now_timestamp;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": now_timestamp(),
    }))
}
