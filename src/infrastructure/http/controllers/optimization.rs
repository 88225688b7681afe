use crate::{
    domain::entities::*,
    infrastructure::http::middleware::{ApiResult, AppState, AuthenticatedUser, JsonBody},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};

pub async fn get_optimization(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<OptimizationReport>> {
    let report = state.optimization_service.report(&auth_user, &id).await?;
    Ok(Json(report))
}

pub async fn update_optimization(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateOptimizationRequest>,
) -> ApiResult<Json<OptimizationUpdateResponse>> {
    let response = state
        .optimization_service
        .update_settings(&auth_user, &id, request)
        .await?;
    Ok(Json(response))
}

pub async fn upload_training_data(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    JsonBody(upload): JsonBody<TrainingDataUpload>,
) -> ApiResult<Json<TrainingUploadResponse>> {
    let response = state
        .optimization_service
        .upload_training_data(&auth_user, &id, upload)
        .await?;
    Ok(Json(response))
}

pub async fn get_training_data(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Query(query): Query<TrainingDataQuery>,
) -> ApiResult<Json<TrainingDataResponse>> {
    let response = state
        .optimization_service
        .list_training_data(&auth_user, &id, query)
        .await?;
    Ok(Json(response))
}

pub async fn get_recommendations(
    State(state): State<AppState>,
    axum::Extension(auth_user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<RecommendationsResponse>> {
    let response = state
        .optimization_service
        .recommendations(&auth_user, &id)
        .await?;
    Ok(Json(response))
}
