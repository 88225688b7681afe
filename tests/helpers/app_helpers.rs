use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use lyzr_desk::{
    application::services::api_key_service::issue_credentials,
    bootstrap::build_app_state_with_provider,
    config::Config,
    domain::entities::*,
    domain::ports::agent_repository::AgentRepository,
    domain::ports::chat_provider::ChatProvider,
    domain::ports::user_repository::UserRepository,
    infrastructure::http::middleware::AppState,
    infrastructure::http::router::build_router,
    infrastructure::persistence::Database,
    infrastructure::providers::LyzrClient,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const FRONTEND_URL: &str = "http://localhost:3000";
pub const BACKEND_URL: &str = "https://desk.example.com";

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 5001,
        frontend_url: FRONTEND_URL.to_string(),
        backend_url: Some(BACKEND_URL.to_string()),
        widget_base_url: None,
        demo_agent_id: None,
        admin_email: "admin@example.com".to_string(),
        admin_name: "Administrator".to_string(),
        admin_api_key: None,
        admin_api_secret: None,
        lyzr_timeout_secs: 2,
        otel_exporter_endpoint: None,
        service_name: "lyzr-desk-test".to_string(),
        metrics_port: None,
    }
}

pub fn test_provider(timeout: Duration) -> Arc<dyn ChatProvider> {
    Arc::new(LyzrClient::new(timeout).expect("Failed to build Lyzr client"))
}

pub fn test_state(db: &Database) -> AppState {
    build_app_state_with_provider(
        db.clone(),
        &test_config(),
        test_provider(Duration::from_secs(2)),
    )
}

pub fn test_app(db: &Database) -> Router {
    build_router(test_state(db), FRONTEND_URL)
}

/// A stored user plus the plain credentials to call the API with.
pub struct TestUser {
    pub user: User,
    pub credentials: ApiCredentials,
}

impl TestUser {
    pub fn basic_auth(&self) -> String {
        let raw = format!(
            "{}:{}",
            self.credentials.api_key, self.credentials.api_secret
        );
        format!("Basic {}", general_purpose::STANDARD.encode(raw))
    }
}

pub async fn create_test_user(db: &Database, email: &str, role: UserRole) -> TestUser {
    let (credentials, hash) = issue_credentials().expect("Failed to issue credentials");
    let mut user = User::new("Test User".to_string(), email.to_string(), role);
    user.api_key = Some(credentials.api_key.clone());
    user.api_secret_hash = Some(hash);
    db.create_user(&user).await.expect("Failed to create user");
    TestUser { user, credentials }
}

pub fn agent_request(lyzr_agent_id: &str, endpoint: &str) -> CreateAgentRequest {
    CreateAgentRequest {
        name: "Support Bot".to_string(),
        description: Some("Answers order questions".to_string()),
        lyzr_config: LyzrConfig {
            agent_id: lyzr_agent_id.to_string(),
            api_endpoint: endpoint.to_string(),
            api_key: "sk-upstream".to_string(),
        },
        widget: None,
        domains: None,
    }
}

pub async fn create_test_agent(
    db: &Database,
    owner_id: &str,
    lyzr_agent_id: &str,
    endpoint: &str,
) -> Agent {
    let agent = Agent::new(owner_id.to_string(), agent_request(lyzr_agent_id, endpoint));
    db.create_agent(&agent).await.expect("Failed to create agent");
    agent
}

/// Send a request through the router and decode the JSON body (Null when
/// the body is empty or not JSON).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Option<&TestUser>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = auth {
        builder = builder
            .header("X-API-Key", &user.credentials.api_key)
            .header("X-API-Secret", &user.credentials.api_secret);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Like [`send`] but returns the raw response for header and text checks.
pub async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8_lossy(&bytes).to_string())
}
