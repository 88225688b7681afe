use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Dashboard origin allowed by CORS
    pub frontend_url: String,
    /// Public base URL injected into served widgets; the request host is
    /// used when unset
    pub backend_url: Option<String>,
    /// Base URL for generated embed snippets
    pub widget_base_url: Option<String>,
    pub demo_agent_id: Option<String>,
    pub admin_email: String,
    pub admin_name: String,
    pub admin_api_key: Option<String>,
    pub admin_api_secret: Option<String>,
    pub lyzr_timeout_secs: u64,
    pub otel_exporter_endpoint: Option<String>,
    pub service_name: String,
    pub metrics_port: Option<u16>,
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://lyzr_desk.db?mode=rwc".to_string());

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "5001".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort("SERVER_PORT"))?;

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let admin_email = env::var("ADMIN_EMAIL").map_err(|_| ConfigError::MissingAdminEmail)?;
        let admin_name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());

        let admin_api_key = optional_var("ADMIN_API_KEY");
        let admin_api_secret = optional_var("ADMIN_API_SECRET");
        if admin_api_key.is_some() != admin_api_secret.is_some() {
            return Err(ConfigError::IncompleteAdminCredentials);
        }

        let lyzr_timeout_secs = env::var("LYZR_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidTimeout)?;

        let metrics_port = optional_var("METRICS_PORT")
            .map(|p| p.parse().map_err(|_| ConfigError::InvalidPort("METRICS_PORT")))
            .transpose()?;

        Ok(Config {
            database_url,
            server_host,
            server_port,
            frontend_url,
            backend_url: optional_var("BACKEND_URL"),
            widget_base_url: optional_var("WIDGET_BASE_URL"),
            demo_agent_id: optional_var("DEMO_AGENT_ID"),
            admin_email,
            admin_name,
            admin_api_key,
            admin_api_secret,
            lyzr_timeout_secs,
            otel_exporter_endpoint: optional_var("OTEL_EXPORTER_OTLP_ENDPOINT"),
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "lyzr-desk".to_string()),
            metrics_port,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ADMIN_EMAIL environment variable not set")]
    MissingAdminEmail,

    #[error("ADMIN_API_KEY and ADMIN_API_SECRET must be set together")]
    IncompleteAdminCredentials,

    #[error("Invalid port number in {0}")]
    InvalidPort(&'static str),

    #[error("LYZR_TIMEOUT_SECS must be a whole number of seconds")]
    InvalidTimeout,
}
