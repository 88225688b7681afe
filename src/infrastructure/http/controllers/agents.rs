use crate::{
    domain::entities::*,
    infrastructure::http::middleware::{ApiResult, AppState, AuthenticatedUser, JsonBody},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

pub async fn list_agents(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
) -> ApiResult<Json<AgentListResponse>> {
    let response = state.agent_service.list_agents(&auth_user).await?;
    Ok(Json(response))
}

pub async fn create_agent(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    JsonBody(request): JsonBody<CreateAgentRequest>,
) -> ApiResult<(StatusCode, Json<Agent>)> {
    let agent = state.agent_service.create_agent(&auth_user, request).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

pub async fn get_agent(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Agent>> {
    let agent = state.agent_service.get_owned_agent(&auth_user, &id).await?;
    Ok(Json(agent))
}

pub async fn update_agent(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateAgentRequest>,
) -> ApiResult<Json<Agent>> {
    let agent = state
        .agent_service
        .update_agent(&auth_user, &id, request)
        .await?;
    Ok(Json(agent))
}

pub async fn delete_agent(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.agent_service.delete_agent(&auth_user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_agent(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Agent>> {
    let agent = state.agent_service.toggle_agent(&auth_user, &id).await?;
    Ok(Json(agent))
}

pub async fn get_widget_snippet(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<WidgetSnippetResponse>> {
    let response = state.agent_service.widget_snippet(&auth_user, &id).await?;
    Ok(Json(response))
}
