use crate::application::services::api_key_service::{has_valid_format, hash_api_secret, issue_credentials};
use crate::application::services::*;
use crate::config::Config;
use crate::domain::entities::*;
use crate::domain::ports::agent_repository::AgentRepository;
use crate::domain::ports::chat_provider::ChatProvider;
use crate::domain::ports::ticket_repository::TicketRepository;
use crate::domain::ports::user_repository::UserRepository;
use crate::infrastructure::http::middleware::{ApiError, AppState};
use crate::infrastructure::persistence::Database;
use crate::infrastructure::providers::LyzrClient;
use crate::shared::utils::email_validator::validate_and_normalize_email;
use std::sync::Arc;
use std::time::Duration;

/// Wire repositories, the upstream client and services into the shared state.
pub fn build_app_state(db: Database, config: &Config) -> Result<AppState, Box<dyn std::error::Error>> {
    let provider: Arc<dyn ChatProvider> =
        Arc::new(LyzrClient::new(Duration::from_secs(config.lyzr_timeout_secs))?);
    tracing::info!(
        "Lyzr client initialized with {}s timeout",
        config.lyzr_timeout_secs
    );

    Ok(build_app_state_with_provider(db, config, provider))
}

/// Same as [`build_app_state`] with an explicit chat provider.
pub fn build_app_state_with_provider(
    db: Database,
    config: &Config,
    provider: Arc<dyn ChatProvider>,
) -> AppState {
    let user_repo: Arc<dyn UserRepository> = Arc::new(db.clone());
    let agent_repo: Arc<dyn AgentRepository> = Arc::new(db.clone());
    let ticket_repo: Arc<dyn TicketRepository> = Arc::new(db);

    // Embed snippets fall back to the backend's own address
    let snippet_base = config
        .widget_base_url
        .clone()
        .or_else(|| config.backend_url.clone())
        .unwrap_or_else(|| format!("http://localhost:{}", config.server_port));

    AppState {
        user_service: UserService::new(user_repo.clone(), ticket_repo.clone()),
        agent_service: AgentService::new(agent_repo.clone(), snippet_base),
        ticket_service: TicketService::new(ticket_repo.clone(), agent_repo.clone(), user_repo),
        chat_service: ChatService::new(agent_repo.clone(), ticket_repo.clone(), provider),
        widget_service: WidgetService::new(
            agent_repo.clone(),
            config.backend_url.clone(),
            config.widget_base_url.clone(),
            config.demo_agent_id.clone(),
        ),
        optimization_service: OptimizationService::new(agent_repo, ticket_repo),
    }
}

/// Create the bootstrap admin on first start.
///
/// Credentials come from `ADMIN_API_KEY`/`ADMIN_API_SECRET` when set,
/// otherwise a fresh pair is generated and logged once.
pub async fn initialize_admin(state: &AppState, config: &Config) -> Result<(), ApiError> {
    tracing::info!("Checking for admin user initialization");

    let email = validate_and_normalize_email(&config.admin_email)
        .map_err(|e| ApiError::Internal(format!("ADMIN_EMAIL is invalid: {}", e)))?;

    if state.user_service.get_user_by_email(&email).await?.is_some() {
        tracing::info!("Admin user already exists: {}", email);
        return Ok(());
    }

    tracing::info!("Creating admin user: {}", email);

    let (api_key, secret_hash, generated_secret) =
        match (&config.admin_api_key, &config.admin_api_secret) {
            (Some(key), Some(secret)) => {
                if !has_valid_format(key, secret) {
                    return Err(ApiError::Internal(
                        "ADMIN_API_KEY must be 32 and ADMIN_API_SECRET 64 alphanumeric characters"
                            .to_string(),
                    ));
                }
                (key.clone(), hash_api_secret(secret)?, None)
            }
            _ => {
                let (credentials, hash) = issue_credentials()?;
                (credentials.api_key, hash, Some(credentials.api_secret))
            }
        };

    let user = User::new(config.admin_name.clone(), email, UserRole::Admin);
    let user = state
        .user_service
        .create_with_credentials(user, api_key, secret_hash)
        .await?;

    tracing::info!("Admin user created successfully: {}", user.email);
    if let Some(secret) = generated_secret {
        // Only chance to see the generated secret
        tracing::warn!(
            "Generated admin API credentials: key={} secret={}",
            user.api_key.as_deref().unwrap_or_default(),
            secret
        );
    }

    Ok(())
}
