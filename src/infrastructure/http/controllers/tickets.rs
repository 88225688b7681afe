use crate::{
    domain::entities::*,
    infrastructure::http::middleware::{ApiResult, AppState, AuthenticatedUser, JsonBody},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

/// Public endpoint; dashboard callers are attached by `optional_auth`.
pub async fn create_ticket(
    State(state): State<AppState>,
    auth_user: Option<Extension<AuthenticatedUser>>,
    JsonBody(request): JsonBody<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    let ticket = state
        .ticket_service
        .create_ticket(auth_user.as_ref().map(|Extension(user)| user), request)
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<TicketListQuery>,
) -> ApiResult<Json<TicketListResponse>> {
    let response = state.ticket_service.list_tickets(&auth_user, query).await?;
    Ok(Json(response))
}

pub async fn ticket_analytics(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<TicketAnalyticsResponse>> {
    let response = state.ticket_service.analytics(&auth_user).await?;
    Ok(Json(response))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Ticket>> {
    let ticket = state.ticket_service.get_ticket(&auth_user, &id).await?;
    Ok(Json(ticket))
}

pub async fn update_ticket(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateTicketRequest>,
) -> ApiResult<Json<Ticket>> {
    let ticket = state
        .ticket_service
        .update_ticket(&auth_user, &id, request)
        .await?;
    Ok(Json(ticket))
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.ticket_service.delete_ticket(&auth_user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_message(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<AddMessageRequest>,
) -> ApiResult<(StatusCode, Json<AddMessageResponse>)> {
    let response = state
        .ticket_service
        .add_message(&auth_user, &id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}
