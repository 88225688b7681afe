use lyzr_desk::bootstrap;
use lyzr_desk::config::Config;
use lyzr_desk::infrastructure::http::router::build_router;
use lyzr_desk::infrastructure::observability;
use lyzr_desk::infrastructure::persistence::Database;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    let _observability = observability::init(&config)?;
    tracing::info!("Configuration loaded");

    // Initialize database connection
    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connection established");

    // Run migrations
    db.run_migrations().await?;
    tracing::info!("Database migrations applied");

    let state = bootstrap::build_app_state(db, &config)?;

    // Initialize admin user
    if let Err(e) = bootstrap::initialize_admin(&state, &config).await {
        tracing::error!("Failed to initialize admin user: {}", e);
        return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()).into());
    }

    let app = build_router(state, &config.frontend_url);

    // Start server
    let addr = config.server_address();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
