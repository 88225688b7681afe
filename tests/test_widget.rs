mod helpers;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use helpers::*;
use lyzr_desk::domain::entities::UserRole;
use lyzr_desk::domain::ports::agent_repository::AgentRepository;
use serde_json::json;

const ENDPOINT: &str = "https://agent.example.com/v3/inference/chat/";

fn script_request(agent_id: &str, origin: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::GET)
        .uri(format!("/api/widget/{}/widget.js", agent_id))
        .header(header::HOST, "widget.test");
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_widget_script_boots_with_agent_config() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let app = test_app(db);
    let owner = create_test_user(db, "owner@example.com", UserRole::User).await;
    let agent = create_test_agent(db, &owner.user.id, "lyzr-widget", ENDPOINT).await;

    let (status, headers, body) = send_raw(&app, script_request(&agent.id, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/javascript"));
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(body.starts_with(&format!("window.LYZR_BACKEND_URL = \"{}\";", BACKEND_URL)));
    assert!(body.contains("window.LyzrWidgetConfig = {"));
    assert!(body.contains(&format!("\"agentId\":\"{}\"", agent.id)));
    assert!(body.contains(&format!("\"apiUrl\":\"{}/api\"", BACKEND_URL)));

    let stored = db.get_agent_by_id(&agent.id).await.unwrap().unwrap();
    assert_eq!(stored.analytics.page_views, 1);
    assert!(stored.analytics.last_seen.is_none());

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_widget_script_failures_are_javascript() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let app = test_app(db);
    let owner = create_test_user(db, "owner@example.com", UserRole::User).await;

    let (status, headers, body) = send_raw(&app, script_request("no-such-agent", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/javascript"));
    assert_eq!(body.trim(), "console.error('Lyzr Widget: Agent not found');");

    let agent = create_test_agent(db, &owner.user.id, "lyzr-paused", ENDPOINT).await;
    db.toggle_agent_active(&agent.id, &owner.user.id, "2026-01-01T00:00:00.000Z")
        .await
        .unwrap();
    let (status, _, body) = send_raw(&app, script_request(&agent.id, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Agent is not active"));

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_widget_script_respects_domain_list() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let app = test_app(db);
    let owner = create_test_user(db, "owner@example.com", UserRole::User).await;
    let mut agent = create_test_agent(db, &owner.user.id, "lyzr-domains", ENDPOINT).await;
    agent.domains = vec!["shop.example.com".to_string()];
    db.update_agent(&agent).await.unwrap();

    let (status, _, body) = send_raw(
        &app,
        script_request(&agent.id, Some("https://evil.example.net")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Domain not allowed"));

    let (status, _, _) = send_raw(
        &app,
        script_request(&agent.id, Some("https://shop.example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Blocked loads are not counted as views
    let stored = db.get_agent_by_id(&agent.id).await.unwrap().unwrap();
    assert_eq!(stored.analytics.page_views, 1);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_widget_config_endpoint() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let app = test_app(db);
    let owner = create_test_user(db, "owner@example.com", UserRole::User).await;
    let agent = create_test_agent(db, &owner.user.id, "lyzr-config", ENDPOINT).await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/widget/{}/config", agent.id),
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["agentId"], agent.id.as_str());
    assert_eq!(body["config"]["title"], "Chat Support");
    assert_eq!(body["config"]["theme"], "light");
    assert_eq!(body["config"]["position"], "bottom-right");
    assert!(body["config"].get("apiUrl").is_none());

    db.toggle_agent_active(&agent.id, &owner.user.id, "2026-01-01T00:00:00.000Z")
        .await
        .unwrap();
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/widget/{}/config", agent.id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_embed_code_escapes_attributes() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let app = test_app(db);
    let owner = create_test_user(db, "owner@example.com", UserRole::User).await;
    let mut agent = create_test_agent(db, &owner.user.id, "lyzr-embed", ENDPOINT).await;
    agent.widget.title = r#"Help "now" <b>"#.to_string();
    db.update_agent(&agent).await.unwrap();

    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("/api/widget/{}/embed-code", agent.id))
        .header(header::HOST, "widget.test")
        .header("X-Forwarded-Proto", "https")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send_raw(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    let widget_url = format!("https://widget.test/api/widget/{}/widget.js", agent.id);
    assert_eq!(body["widgetUrl"], widget_url.as_str());
    let code = body["embedCode"].as_str().unwrap();
    assert!(code.contains(&format!("src=\"{}\"", widget_url)));
    assert!(code.contains("data-title=\"Help &quot;now&quot; &lt;b&gt;\""));

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_tracking_beacons_update_counters() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let app = test_app(db);
    let owner = create_test_user(db, "owner@example.com", UserRole::User).await;
    let agent = create_test_agent(db, &owner.user.id, "lyzr-track", ENDPOINT).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/widget/{}/analytics/view", agent.id),
        None,
        Some(json!({ "url": "https://shop.example.com/cart" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Page view tracked");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/widget/{}/analytics/interaction", agent.id),
        None,
        Some(json!({ "type": "chat_opened", "sessionId": "s-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    send(
        &app,
        Method::POST,
        &format!("/api/widget/{}/analytics/interaction", agent.id),
        None,
        Some(json!({ "type": "message_sent" })),
    )
    .await;

    let stored = db.get_agent_by_id(&agent.id).await.unwrap().unwrap();
    assert_eq!(stored.analytics.page_views, 1);
    assert!(stored.analytics.last_seen.is_some());
    assert_eq!(stored.analytics.total_chats, 1);
    assert_eq!(stored.analytics.total_messages, 1);

    // Beacons for unknown agents are accepted and ignored
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/widget/ghost/analytics/view",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_widget_preflight_is_cached_for_an_hour() {
    let test_db = setup_test_db().await;
    let app = test_app(test_db.db());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/widget/any-agent/widget.js")
        .header(header::ORIGIN, "https://shop.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send_raw(&app, request).await;

    assert!(status.is_success());
    assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "3600");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_demo_page_without_agent_shows_instructions() {
    let test_db = setup_test_db().await;
    let app = test_app(test_db.db());

    let request = Request::builder()
        .method(Method::GET)
        .uri("/demo")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send_raw(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(body.contains("Lyzr Support Widget Demo"));
    assert!(body.contains("DEMO_AGENT_ID"));
    assert!(!body.contains("<script"));

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_health_check() {
    let test_db = setup_test_db().await;
    let app = test_app(test_db.db());

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].is_string());

    teardown_test_db(test_db).await;
}
