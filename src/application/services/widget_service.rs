use std::sync::Arc;

use askama::Template;
use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::entities::*;
use crate::domain::ports::agent_repository::AgentRepository;
use crate::domain::services::is_origin_allowed;
use crate::infrastructure::http::middleware::{ApiError, ApiResult};
use crate::infrastructure::observability::{WIDGET_BLOCKED_TOTAL, WIDGET_LOADS_TOTAL};
use crate::shared::utils::{escape_html, now_timestamp, script_json};

const WIDGET_SOURCE: &str = include_str!("../../../assets/widget.js");

/// Failures while serving the widget script. Each one is reported to the
/// embedding page as a JavaScript snippet.
#[derive(Debug, Error)]
pub enum WidgetScriptError {
    #[error("Agent not found")]
    NotFound,
    #[error("Agent is not active")]
    Inactive,
    #[error("Domain not allowed")]
    DomainNotAllowed,
    #[error("Server error")]
    Internal(#[source] ApiError),
}

impl WidgetScriptError {
    pub fn status(&self) -> StatusCode {
        match self {
            WidgetScriptError::NotFound => StatusCode::NOT_FOUND,
            WidgetScriptError::Inactive | WidgetScriptError::DomainNotAllowed => {
                StatusCode::FORBIDDEN
            }
            WidgetScriptError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn script_body(&self) -> String {
        format!("console.error('Lyzr Widget: {}');\n", self)
    }
}

impl From<ApiError> for WidgetScriptError {
    fn from(err: ApiError) -> Self {
        WidgetScriptError::Internal(err)
    }
}

#[derive(Template)]
#[template(path = "demo.html")]
struct DemoTemplate<'a> {
    backend_url: &'a str,
    demo_agent_id: Option<&'a str>,
}

#[derive(Clone)]
pub struct WidgetService {
    agent_repo: Arc<dyn AgentRepository>,
    /// Fixed public base URL; the request's own origin is used when unset
    backend_url: Option<String>,
    widget_base_url: Option<String>,
    demo_agent_id: Option<String>,
}

fn trimmed(url: Option<String>) -> Option<String> {
    url.map(|u| u.trim_end_matches('/').to_string())
}

impl WidgetService {
    pub fn new(
        agent_repo: Arc<dyn AgentRepository>,
        backend_url: Option<String>,
        widget_base_url: Option<String>,
        demo_agent_id: Option<String>,
    ) -> Self {
        Self {
            agent_repo,
            backend_url: trimmed(backend_url),
            widget_base_url: trimmed(widget_base_url),
            demo_agent_id,
        }
    }

    fn backend_base<'a>(&'a self, request_base: &'a str) -> &'a str {
        self.backend_url.as_deref().unwrap_or(request_base)
    }

    async fn load_agent(&self, agent_id: &str) -> ApiResult<Agent> {
        self.agent_repo
            .get_agent_by_id(agent_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Agent not found".to_string()))
    }

    /// Render the widget script with the agent's configuration prepended.
    #[tracing::instrument(skip(self, request_base))]
    pub async fn widget_script(
        &self,
        agent_id: &str,
        origin: Option<&str>,
        request_base: &str,
    ) -> Result<String, WidgetScriptError> {
        let agent = self
            .agent_repo
            .get_agent_by_id(agent_id)
            .await?
            .ok_or(WidgetScriptError::NotFound)?;
        if !agent.is_active {
            return Err(WidgetScriptError::Inactive);
        }
        if !is_origin_allowed(&agent.domains, origin) {
            metrics::counter!(WIDGET_BLOCKED_TOTAL).increment(1);
            tracing::warn!("Widget for agent {} blocked for origin {:?}", agent.id, origin);
            return Err(WidgetScriptError::DomainNotAllowed);
        }

        let backend_url = self.backend_base(request_base);
        let config = serde_json::to_value(WidgetConfig::for_script(&agent, backend_url))
            .map_err(ApiError::from)?;
        let script = format!(
            "window.LYZR_BACKEND_URL = {backend};\nwindow.LyzrWidgetConfig = {config};\n{source}",
            backend = script_json(&serde_json::Value::String(backend_url.to_string())),
            config = script_json(&config),
            source = WIDGET_SOURCE,
        );

        self.agent_repo.record_script_load(&agent.id).await?;
        metrics::counter!(WIDGET_LOADS_TOTAL).increment(1);

        Ok(script)
    }

    pub async fn widget_config(&self, agent_id: &str) -> ApiResult<WidgetConfigResponse> {
        let agent = self.load_agent(agent_id).await?;
        if !agent.is_active {
            return Err(ApiError::Forbidden("Agent is not active".to_string()));
        }

        Ok(WidgetConfigResponse {
            config: WidgetConfig::for_agent(&agent),
        })
    }

    /// Script tag configured through data attributes.
    pub async fn embed_code(&self, agent_id: &str, request_base: &str) -> ApiResult<EmbedCodeResponse> {
        let agent = self.load_agent(agent_id).await?;
        let base = self.widget_base_url.as_deref().unwrap_or(request_base);
        let widget_url = format!("{}/api/widget/{}/widget.js", base, agent.id);
        let config = WidgetConfig::for_agent(&agent);

        let embed_code = format!(
            r#"<!-- Lyzr Support Widget -->
<script
  src="{src}"
  data-agent-id="{id}"
  data-title="{title}"
  data-welcome-message="{welcome}"
  data-theme="{theme}"
  data-primary-color="{color}"
  data-position="{position}"
></script>"#,
            src = escape_html(&widget_url),
            id = escape_html(&agent.id),
            title = escape_html(&config.title),
            welcome = escape_html(&config.welcome_message),
            theme = config.theme.as_str(),
            color = escape_html(&config.primary_color),
            position = config.position.as_str(),
        );

        Ok(EmbedCodeResponse {
            embed_code,
            agent_id: agent.id,
            widget_url,
        })
    }

    pub async fn track_view(&self, agent_id: &str, view: PageViewRequest) -> ApiResult<TrackingResponse> {
        tracing::debug!("Page view for agent {} at {:?}", agent_id, view.url);
        self.agent_repo
            .record_page_view(agent_id, &now_timestamp())
            .await?;

        Ok(TrackingResponse {
            message: "Page view tracked".to_string(),
        })
    }

    pub async fn track_interaction(
        &self,
        agent_id: &str,
        interaction: InteractionRequest,
    ) -> ApiResult<TrackingResponse> {
        let kind = InteractionKind::parse(&interaction.kind);
        tracing::debug!(
            "Widget interaction {:?} for agent {} (session {:?})",
            kind,
            agent_id,
            interaction.session_id
        );
        self.agent_repo
            .record_widget_interaction(agent_id, kind, &now_timestamp())
            .await?;

        Ok(TrackingResponse {
            message: "Interaction tracked".to_string(),
        })
    }

    pub fn demo_page(&self, request_base: &str) -> ApiResult<String> {
        DemoTemplate {
            backend_url: self.backend_base(request_base),
            demo_agent_id: self.demo_agent_id.as_deref(),
        }
        .render()
        .map_err(|e| ApiError::Internal(format!("Demo page rendering failed: {}", e)))
    }
}
