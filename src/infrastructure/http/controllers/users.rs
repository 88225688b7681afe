use crate::{
    domain::entities::*,
    infrastructure::http::middleware::{ApiResult, AppState, AuthenticatedUser, JsonBody},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

pub async fn create_user(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    JsonBody(request): JsonBody<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<CreateUserResponse>)> {
    let response = state.user_service.create_user(&auth_user, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_users(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<UserListResponse>> {
    let response = state.user_service.list_users(&auth_user, query).await?;
    Ok(Json(response))
}

pub async fn user_analytics(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
) -> ApiResult<Json<UserAnalyticsResponse>> {
    let response = state.user_service.analytics(&auth_user).await?;
    Ok(Json(response))
}

pub async fn get_user(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserDetailResponse>> {
    let response = state.user_service.get_user_detail(&auth_user, &id).await?;
    Ok(Json(response))
}

pub async fn update_user(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let user = state
        .user_service
        .update_user(&auth_user, &id, request)
        .await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.user_service.delete_user(&auth_user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Issue a new key/secret pair; the secret is only returned here.
pub async fn rotate_api_key(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiCredentials>> {
    let credentials = state
        .user_service
        .rotate_credentials(&auth_user, &id)
        .await?;
    Ok(Json(credentials))
}
