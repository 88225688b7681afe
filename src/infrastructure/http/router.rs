use std::time::Duration;

use crate::infrastructure::http::controllers::{
    agents, chat, health, optimization, tickets, users, widget,
};
use crate::infrastructure::http::middleware::{optional_auth, require_auth, AppState};
use axum::{
    handler::Handler,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

const MAX_BODY_BYTES: usize = 1024 * 1024;
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(3600);

fn allowed_headers() -> [HeaderName; 5] {
    [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        HeaderName::from_static("x-api-key"),
        HeaderName::from_static("x-api-secret"),
        HeaderName::from_static("x-requested-with"),
    ]
}

/// CORS for endpoints embedded on third-party sites.
fn open_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(allowed_headers())
        .max_age(PREFLIGHT_MAX_AGE)
}

/// CORS for the dashboard API, limited to the configured frontend origin.
fn dashboard_cors(frontend_url: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            tracing::warn!("FRONTEND_URL {:?} is not a valid origin; cross-origin dashboard requests will fail", frontend_url);
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(allowed_headers())
}

pub fn build_router(state: AppState, frontend_url: &str) -> Router {
    let auth = axum::middleware::from_fn_with_state(state.clone(), require_auth);
    let maybe_auth = axum::middleware::from_fn_with_state(state.clone(), optional_auth);

    // Dashboard API (requires API credentials)
    let protected = Router::new()
        // Agents
        .route("/api/agents", get(agents::list_agents).post(agents::create_agent))
        .route(
            "/api/agents/:id",
            get(agents::get_agent)
                .put(agents::update_agent)
                .delete(agents::delete_agent),
        )
        .route("/api/agents/:id/toggle", patch(agents::toggle_agent))
        .route("/api/agents/:id/widget", get(agents::get_widget_snippet))
        // Optimization
        .route(
            "/api/agents/:id/optimization",
            get(optimization::get_optimization).put(optimization::update_optimization),
        )
        .route(
            "/api/agents/:id/training-data",
            get(optimization::get_training_data).post(optimization::upload_training_data),
        )
        .route(
            "/api/agents/:id/recommendations",
            get(optimization::get_recommendations),
        )
        // Chat
        .route("/api/chat/test/:agent_id", post(chat::test_agent))
        // Tickets
        .route("/api/tickets/analytics", get(tickets::ticket_analytics))
        .route(
            "/api/tickets/:id",
            get(tickets::get_ticket)
                .put(tickets::update_ticket)
                .delete(tickets::delete_ticket),
        )
        .route("/api/tickets/:id/messages", post(tickets::add_message))
        // Users
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/analytics", get(users::user_analytics))
        .route(
            "/api/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/api/users/:id/api-key", post(users::rotate_api_key))
        .route_layer(auth.clone())
        .layer(dashboard_cors(frontend_url));

    // Ticket creation is public (widget forms) but attaches dashboard callers
    let ticket_routes = Router::new()
        .route(
            "/api/tickets",
            post(tickets::create_ticket.layer(maybe_auth))
                .get(tickets::list_tickets.layer(auth)),
        )
        .layer(open_cors());

    // Embedded widget and chat relay
    let public = Router::new()
        .route("/api/chat/message", post(chat::send_message))
        .route(
            "/api/widget/:agent_id/widget.js",
            get(widget::serve_widget).options(widget::widget_preflight),
        )
        .route("/api/widget/:agent_id/config", get(widget::get_widget_config))
        .route("/api/widget/:agent_id/embed-code", get(widget::get_embed_code))
        .route(
            "/api/widget/:agent_id/analytics/view",
            post(widget::track_page_view),
        )
        .route(
            "/api/widget/:agent_id/analytics/interaction",
            post(widget::track_interaction),
        )
        .layer(open_cors());

    Router::new()
        .route("/health", get(health::health))
        .route("/demo", get(widget::demo_page))
        .merge(public)
        .merge(ticket_routes)
        .merge(protected)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
