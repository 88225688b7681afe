mod helpers;

use axum::http::{Method, StatusCode};
use helpers::*;
use lyzr_desk::domain::entities::{ApiCredentials, UserRole};
use lyzr_desk::domain::ports::user_repository::UserRepository;
use serde_json::{json, Value};

fn credentials_from(body: &Value) -> ApiCredentials {
    ApiCredentials {
        api_key: body["apiKey"].as_str().unwrap().to_string(),
        api_secret: body["apiSecret"].as_str().unwrap().to_string(),
    }
}

#[tokio::test]
async fn test_admin_creates_user_with_working_credentials() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let app = test_app(db);
    let admin = create_test_user(db, "admin@example.com", UserRole::Admin).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(&admin),
        Some(json!({
            "name": "Support Lead",
            "email": "Lead@Example.com",
            "subscription": { "plan": "pro" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "lead@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert_eq!(body["user"]["subscription"]["plan"], "pro");
    assert!(body["user"].get("apiSecretHash").is_none());

    let lead = TestUser {
        user: db
            .get_user_by_email("lead@example.com")
            .await
            .unwrap()
            .unwrap(),
        credentials: credentials_from(&body["credentials"]),
    };
    let (status, _) = send(&app, Method::GET, "/api/agents", Some(&lead), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(&admin),
        Some(json!({ "name": "Again", "email": "lead@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "A user with this email already exists");

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_non_admin_cannot_create_or_delete_users() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let app = test_app(db);
    let member = create_test_user(db, "member@example.com", UserRole::User).await;
    let other = create_test_user(db, "other@example.com", UserRole::User).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(&member),
        Some(json!({ "name": "Sneaky", "email": "sneaky@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/users/{}", other.user.id),
        Some(&member),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_profile_update_rules() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let app = test_app(db);
    let member = create_test_user(db, "member@example.com", UserRole::User).await;
    let other = create_test_user(db, "other@example.com", UserRole::User).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/users/{}", other.user.id),
        Some(&member),
        Some(json!({ "name": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only update your own profile");

    // Role changes are silently dropped for self-service, leaving nothing
    let own = format!("/api/users/{}", member.user.id);
    let (status, body) = send(
        &app,
        Method::PUT,
        &own,
        Some(&member),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No valid fields to update");

    let (status, body) = send(
        &app,
        Method::PUT,
        &own,
        Some(&member),
        Some(json!({ "name": "Member Renamed", "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Member Renamed");
    assert_eq!(body["role"], "user");

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_rotation_invalidates_old_credentials() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let app = test_app(db);
    let member = create_test_user(db, "member@example.com", UserRole::User).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/users/{}/api-key", member.user.id),
        Some(&member),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rotated = TestUser {
        user: member.user.clone(),
        credentials: credentials_from(&body),
    };
    assert_ne!(rotated.credentials.api_key, member.credentials.api_key);

    let (status, _) = send(&app, Method::GET, "/api/agents", Some(&member), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/agents", Some(&rotated), None).await;
    assert_eq!(status, StatusCode::OK);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_deactivated_user_cannot_authenticate() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let app = test_app(db);
    let admin = create_test_user(db, "admin@example.com", UserRole::Admin).await;
    let member = create_test_user(db, "member@example.com", UserRole::User).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/users/{}", member.user.id),
        Some(&admin),
        Some(json!({ "status": "inactive" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "inactive");

    let (status, _) = send(&app, Method::GET, "/api/agents", Some(&member), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_admin_cannot_delete_self_but_can_delete_others() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let app = test_app(db);
    let admin = create_test_user(db, "admin@example.com", UserRole::Admin).await;
    let member = create_test_user(db, "member@example.com", UserRole::User).await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/users/{}", admin.user.id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You cannot delete your own account");

    let uri = format!("/api/users/{}", member.user.id);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    teardown_test_db(test_db).await;
}

#[tokio::test]
async fn test_listing_and_analytics_scope() {
    let test_db = setup_test_db().await;
    let db = test_db.db();
    let app = test_app(db);
    let admin = create_test_user(db, "admin@example.com", UserRole::Admin).await;
    let member = create_test_user(db, "member@example.com", UserRole::User).await;

    let (status, body) = send(&app, Method::GET, "/api/users?limit=1", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["pagination"]["pages"], 2);

    let (status, body) = send(&app, Method::GET, "/api/users/analytics", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overview"]["totalUsers"], 2);
    assert!(body["subscriptions"].is_array());

    // A member without ticket customers sees nobody
    let (_, body) = send(&app, Method::GET, "/api/users", Some(&member), None).await;
    assert_eq!(body["pagination"]["total"], 0);

    let (_, body) = send(&app, Method::GET, "/api/users/analytics", Some(&member), None).await;
    assert_eq!(body["overview"]["totalUsers"], 0);
    assert!(body["subscriptions"].is_null());

    teardown_test_db(test_db).await;
}
