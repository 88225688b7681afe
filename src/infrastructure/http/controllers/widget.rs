use crate::{
    application::services::WidgetScriptError,
    domain::entities::*,
    infrastructure::http::middleware::{ApiResult, AppState, JsonBody},
};
use axum::{
    extract::{Path, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, CACHE_CONTROL, CONTENT_TYPE,
            HOST, ORIGIN, REFERER,
        },
        HeaderMap, StatusCode,
    },
    response::{Html, IntoResponse, Response},
    Json,
};

const JAVASCRIPT: &str = "application/javascript; charset=utf-8";

/// Scheme and host the request was addressed to, honouring a proxy's
/// `X-Forwarded-Proto`.
fn request_base(headers: &HeaderMap) -> String {
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("X-Forwarded-Proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");
    format!("{}://{}", scheme, host)
}

fn header_str(headers: &HeaderMap, name: axum::http::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

pub async fn widget_preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
            (
                ACCESS_CONTROL_ALLOW_HEADERS,
                "Content-Type, Authorization, X-Requested-With",
            ),
            (ACCESS_CONTROL_MAX_AGE, "3600"),
        ],
    )
}

/// Serve the widget script. Failures are returned as JavaScript too, so the
/// embedding page logs the reason instead of a parse error.
pub async fn serve_widget(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let origin = header_str(&headers, ORIGIN).or_else(|| header_str(&headers, REFERER));
    let base = request_base(&headers);

    let (status, body) = match state
        .widget_service
        .widget_script(&agent_id, origin, &base)
        .await
    {
        Ok(script) => (StatusCode::OK, script),
        Err(err) => {
            if let WidgetScriptError::Internal(cause) = &err {
                tracing::error!("Serving widget for agent {} failed: {}", agent_id, cause);
            }
            (err.status(), err.script_body())
        }
    };

    (
        status,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
            (CONTENT_TYPE, JAVASCRIPT),
            (CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

pub async fn get_widget_config(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> ApiResult<Json<WidgetConfigResponse>> {
    let response = state.widget_service.widget_config(&agent_id).await?;
    Ok(Json(response))
}

pub async fn get_embed_code(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<EmbedCodeResponse>> {
    let response = state
        .widget_service
        .embed_code(&agent_id, &request_base(&headers))
        .await?;
    Ok(Json(response))
}

pub async fn track_page_view(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    view: Option<Json<PageViewRequest>>,
) -> ApiResult<Json<TrackingResponse>> {
    let view = view.map(|Json(v)| v).unwrap_or_default();
    let response = state.widget_service.track_view(&agent_id, view).await?;
    Ok(Json(response))
}

pub async fn track_interaction(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    JsonBody(interaction): JsonBody<InteractionRequest>,
) -> ApiResult<Json<TrackingResponse>> {
    let response = state
        .widget_service
        .track_interaction(&agent_id, interaction)
        .await?;
    Ok(Json(response))
}

pub async fn demo_page(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Html<String>> {
    let page = state.widget_service.demo_page(&request_base(&headers))?;
    Ok(Html(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_base_uses_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, "desk.example.com".parse().unwrap());
        assert_eq!(request_base(&headers), "http://desk.example.com");

        headers.insert("X-Forwarded-Proto", "https".parse().unwrap());
        assert_eq!(request_base(&headers), "https://desk.example.com");
    }
}
