use axum::{
    extract::{Request, State},
    http::header::{HeaderMap, AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose, Engine as _};

use crate::application::services::{
    AgentService, ChatService, OptimizationService, TicketService, UserService, WidgetService,
};
use crate::domain::entities::User;
use crate::infrastructure::http::middleware::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub agent_service: AgentService,
    pub ticket_service: TicketService,
    pub chat_service: ChatService,
    pub widget_service: WidgetService,
    pub optimization_service: OptimizationService,
}

/// Caller resolved from API credentials, stored in request extensions.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user: User,
}

impl AuthenticatedUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

/// Extract API credentials from request headers.
///
/// `X-API-Key`/`X-API-Secret` take priority over
/// `Authorization: Basic base64(key:secret)`.
fn extract_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    if let (Some(api_key), Some(api_secret)) =
        (headers.get("X-API-Key"), headers.get("X-API-Secret"))
    {
        if let (Ok(key), Ok(secret)) = (api_key.to_str(), api_secret.to_str()) {
            return Some((key.to_string(), secret.to_string()));
        }
    }

    let encoded = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Basic ")?;
    let decoded = String::from_utf8(general_purpose::STANDARD.decode(encoded).ok()?).ok()?;
    let (key, secret) = decoded.split_once(':')?;
    Some((key.to_string(), secret.to_string()))
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, ApiError> {
    match extract_credentials(headers) {
        Some((api_key, api_secret)) => state
            .user_service
            .authenticate(&api_key, &api_secret)
            .await?
            .map(Some)
            .ok_or(ApiError::Unauthorized),
        None => Ok(None),
    }
}

/// Reject the request unless it carries valid credentials of an active user.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, request.headers())
        .await?
        .ok_or(ApiError::Unauthorized)?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user });
    Ok(next.run(request).await)
}

/// Attach the caller when credentials are present. Anonymous requests pass
/// through; present but invalid credentials are still rejected.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(user) = authenticate(&state, request.headers()).await? {
        request
            .extensions_mut()
            .insert(AuthenticatedUser { user });
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_credentials_custom_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("X-API-Key", "key123".parse().unwrap());
        headers.insert("X-API-Secret", "secret456".parse().unwrap());

        let (key, secret) = extract_credentials(&headers).unwrap();
        assert_eq!(key, "key123");
        assert_eq!(secret, "secret456");
    }

    #[test]
    fn test_extract_credentials_basic_auth() {
        let mut headers = HeaderMap::new();
        let credentials = general_purpose::STANDARD.encode("mykey:mysecret");
        headers.insert(AUTHORIZATION, format!("Basic {}", credentials).parse().unwrap());

        let (key, secret) = extract_credentials(&headers).unwrap();
        assert_eq!(key, "mykey");
        assert_eq!(secret, "mysecret");
    }

    #[test]
    fn test_extract_credentials_prefers_custom_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("X-API-Key", "custom_key".parse().unwrap());
        headers.insert("X-API-Secret", "custom_secret".parse().unwrap());
        let credentials = general_purpose::STANDARD.encode("basic_key:basic_secret");
        headers.insert(AUTHORIZATION, format!("Basic {}", credentials).parse().unwrap());

        let (key, _) = extract_credentials(&headers).unwrap();
        assert_eq!(key, "custom_key");
    }

    #[test]
    fn test_extract_credentials_ignores_bearer_and_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert!(extract_credentials(&headers).is_none());

        headers.insert(AUTHORIZATION, "Basic !!!notbase64".parse().unwrap());
        assert!(extract_credentials(&headers).is_none());

        assert!(extract_credentials(&HeaderMap::new()).is_none());
    }
}
