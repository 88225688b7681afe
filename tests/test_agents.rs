mod helpers;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use helpers::*;
use lyzr_desk::domain::entities::UserRole;
use serde_json::json;

fn agent_body(lyzr_agent_id: &str) -> serde_json::Value {
    json!({
        "name": "Order Helper",
        "description": "Answers shipping questions",
        "lyzrConfig": {
            "agentId": lyzr_agent_id,
            "apiEndpoint": "https://agent.example.com/v3/inference/chat/",
            "apiKey": "sk-upstream"
        },
        "widget": { "theme": "dark", "primaryColor": "#112233" },
        "domains": ["shop.example.com", "*.example.org"]
    })
}

#[tokio::test]
async fn test_create_agent_applies_defaults() {
    let test_db = setup_test_db().await;
    let app = test_app(test_db.db());
    let owner = create_test_user(test_db.db(), "owner@example.com", UserRole::User).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/agents",
        Some(&owner),
        Some(agent_body("lyzr-create")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["owner"], owner.user.id.as_str());
    assert_eq!(body["isActive"], true);
    assert_eq!(body["widget"]["theme"], "dark");
    assert_eq!(body["widget"]["primaryColor"], "#112233");
    assert_eq!(body["widget"]["position"], "bottom-right");
    assert_eq!(body["analytics"]["totalChats"], 0);

    let (status, list) = send(&app, Method::GET, "/api/agents", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 1);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_agent_with_unset_optional_columns_loads() {
    let test_db = setup_test_db().await;
    let app = test_app(test_db.db());
    let owner = create_test_user(test_db.db(), "owner@example.com", UserRole::User).await;

    let mut request = agent_body("lyzr-sparse");
    request.as_object_mut().unwrap().remove("description");
    let (status, created) = send(&app, Method::POST, "/api/agents", Some(&owner), Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/agents/{}", created["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["description"].is_null());
    assert!(body["optimization"].is_null());
    assert!(body["lastTrainingUpdate"].is_null());
    assert!(body["analytics"]["lastUsed"].is_null());

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_duplicate_lyzr_agent_id_conflicts() {
    let test_db = setup_test_db().await;
    let app = test_app(test_db.db());
    let owner = create_test_user(test_db.db(), "owner@example.com", UserRole::User).await;
    let other = create_test_user(test_db.db(), "other@example.com", UserRole::User).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/agents",
        Some(&owner),
        Some(agent_body("lyzr-dup")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Uniqueness is global, not per owner
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/agents",
        Some(&other),
        Some(agent_body("lyzr-dup")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Agent with this Lyzr ID already exists");

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_invalid_agent_reports_field_errors() {
    let test_db = setup_test_db().await;
    let app = test_app(test_db.db());
    let owner = create_test_user(test_db.db(), "owner@example.com", UserRole::User).await;

    let mut body = agent_body("lyzr-invalid");
    body["name"] = json!("A");
    body["widget"]["primaryColor"] = json!("blue");

    let (status, response) =
        send(&app, Method::POST, "/api/agents", Some(&owner), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = response["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"widget.primaryColor"));

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_toggle_twice_restores_state() {
    let test_db = setup_test_db().await;
    let app = test_app(test_db.db());
    let owner = create_test_user(test_db.db(), "owner@example.com", UserRole::User).await;
    let agent = create_test_agent(
        test_db.db(),
        &owner.user.id,
        "lyzr-toggle",
        "https://agent.example.com/chat/",
    )
    .await;
    let uri = format!("/api/agents/{}/toggle", agent.id);

    let (status, body) = send(&app, Method::PATCH, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isActive"], false);

    let (_, body) = send(&app, Method::PATCH, &uri, Some(&owner), None).await;
    assert_eq!(body["isActive"], true);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_agents_are_scoped_to_owner() {
    let test_db = setup_test_db().await;
    let app = test_app(test_db.db());
    let owner = create_test_user(test_db.db(), "owner@example.com", UserRole::User).await;
    let stranger = create_test_user(test_db.db(), "stranger@example.com", UserRole::Admin).await;
    let agent = create_test_agent(
        test_db.db(),
        &owner.user.id,
        "lyzr-owned",
        "https://agent.example.com/chat/",
    )
    .await;
    let uri = format!("/api/agents/{}", agent.id);

    // Even an admin only sees their own agents
    let (status, _) = send(&app, Method::GET, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&stranger),
        Some(json!({ "name": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Support Bot");

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_update_and_delete_agent() {
    let test_db = setup_test_db().await;
    let app = test_app(test_db.db());
    let owner = create_test_user(test_db.db(), "owner@example.com", UserRole::User).await;
    let agent = create_test_agent(
        test_db.db(),
        &owner.user.id,
        "lyzr-update",
        "https://agent.example.com/chat/",
    )
    .await;
    let uri = format!("/api/agents/{}", agent.id);

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&owner),
        Some(json!({ "name": "Renamed", "widget": { "title": "Help" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["widget"]["title"], "Help");
    assert_eq!(body["widget"]["theme"], "light");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_missing_or_wrong_credentials_are_rejected() {
    let test_db = setup_test_db().await;
    let app = test_app(test_db.db());
    let owner = create_test_user(test_db.db(), "owner@example.com", UserRole::User).await;

    let (status, _) = send(&app, Method::GET, "/api/agents", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/agents")
        .header("X-API-Key", &owner.credentials.api_key)
        .header("X-API-Secret", "wrong-secret")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send_raw(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_basic_auth_is_accepted() {
    let test_db = setup_test_db().await;
    let app = test_app(test_db.db());
    let owner = create_test_user(test_db.db(), "owner@example.com", UserRole::User).await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/agents")
        .header(header::AUTHORIZATION, owner.basic_auth())
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send_raw(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"count\":0"));

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_widget_snippet_points_at_backend_script() {
    let test_db = setup_test_db().await;
    let app = test_app(test_db.db());
    let owner = create_test_user(test_db.db(), "owner@example.com", UserRole::User).await;
    let agent = create_test_agent(
        test_db.db(),
        &owner.user.id,
        "lyzr-snippet",
        "https://agent.example.com/chat/",
    )
    .await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/agents/{}/widget", agent.id),
        Some(&owner),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["agentId"], agent.id.as_str());
    let code = body["widgetCode"].as_str().unwrap();
    assert!(code.contains(&format!(
        "{}/api/widget/{}/widget.js",
        BACKEND_URL, agent.id
    )));
    assert!(code.contains("window.LyzrWidgetConfig"));

    teardown_test_db(test_db).await;
}
