use std::net::SocketAddr;

use crate::{
    domain::entities::*,
    infrastructure::http::middleware::{ApiResult, AppState, AuthenticatedUser, JsonBody},
};
use axum::{
    extract::{ConnectInfo, Path, State},
    Json,
};

/// Widget chat endpoint. The peer address identifies the caller upstream.
pub async fn send_message(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    JsonBody(request): JsonBody<ChatMessageRequest>,
) -> ApiResult<Json<ChatMessageResponse>> {
    let caller_ip = peer.map(|ConnectInfo(addr)| addr.ip().to_string());
    let response = state
        .chat_service
        .send_message(caller_ip.as_deref(), request)
        .await?;
    Ok(Json(response))
}

pub async fn test_agent(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(agent_id): Path<String>,
) -> ApiResult<Json<TestConnectionResponse>> {
    let response = state
        .chat_service
        .test_connection(&auth_user, &agent_id)
        .await?;
    Ok(Json(response))
}
