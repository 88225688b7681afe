use std::sync::Arc;

use crate::domain::entities::*;
use crate::domain::ports::agent_repository::AgentRepository;
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AuthenticatedUser};
use crate::shared::utils::{now_timestamp, script_json};

const DUPLICATE_LYZR_ID: &str = "Agent with this Lyzr ID already exists";

#[derive(Clone)]
pub struct AgentService {
    agent_repo: Arc<dyn AgentRepository>,
    /// Public base URL the widget script is served from
    widget_base_url: String,
}

impl AgentService {
    pub fn new(agent_repo: Arc<dyn AgentRepository>, widget_base_url: String) -> Self {
        Self {
            agent_repo,
            widget_base_url: widget_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Load an agent owned by the caller or fail with 404.
    pub async fn get_owned_agent(&self, auth_user: &AuthenticatedUser, id: &str) -> ApiResult<Agent> {
        self.agent_repo
            .get_owned_agent(id, auth_user.id())
            .await?
            .ok_or_else(|| ApiError::NotFound("Agent not found".to_string()))
    }

    pub async fn list_agents(&self, auth_user: &AuthenticatedUser) -> ApiResult<AgentListResponse> {
        let agents = self.agent_repo.list_agents_by_owner(auth_user.id()).await?;
        Ok(AgentListResponse {
            count: agents.len(),
            agents,
        })
    }

    #[tracing::instrument(skip(self, auth_user, request), fields(owner = %auth_user.id()))]
    pub async fn create_agent(
        &self,
        auth_user: &AuthenticatedUser,
        request: CreateAgentRequest,
    ) -> ApiResult<Agent> {
        request.validate()?;

        // The unique index backs this up under concurrent creates
        if self
            .agent_repo
            .lyzr_agent_id_exists(&request.lyzr_config.agent_id, None)
            .await?
        {
            return Err(ApiError::Conflict(DUPLICATE_LYZR_ID.to_string()));
        }

        let agent = Agent::new(auth_user.id().to_string(), request);
        self.agent_repo.create_agent(&agent).await?;

        Ok(agent)
    }

    #[tracing::instrument(skip(self, auth_user, request), fields(owner = %auth_user.id()))]
    pub async fn update_agent(
        &self,
        auth_user: &AuthenticatedUser,
        id: &str,
        request: UpdateAgentRequest,
    ) -> ApiResult<Agent> {
        request.validate()?;

        let mut agent = self.get_owned_agent(auth_user, id).await?;

        if let Some(config) = &request.lyzr_config {
            if config.agent_id != agent.lyzr_config.agent_id
                && self
                    .agent_repo
                    .lyzr_agent_id_exists(&config.agent_id, Some(&agent.id))
                    .await?
            {
                return Err(ApiError::Conflict(DUPLICATE_LYZR_ID.to_string()));
            }
        }

        agent.apply_update(request);
        self.agent_repo.update_agent(&agent).await?;

        Ok(agent)
    }

    pub async fn delete_agent(&self, auth_user: &AuthenticatedUser, id: &str) -> ApiResult<()> {
        if !self.agent_repo.delete_agent(id, auth_user.id()).await? {
            return Err(ApiError::NotFound("Agent not found".to_string()));
        }

        tracing::info!("Agent {} deleted by {}", id, auth_user.id());
        Ok(())
    }

    /// Flip the active flag and return the agent as stored afterwards.
    pub async fn toggle_agent(&self, auth_user: &AuthenticatedUser, id: &str) -> ApiResult<Agent> {
        if !self
            .agent_repo
            .toggle_agent_active(id, auth_user.id(), &now_timestamp())
            .await?
        {
            return Err(ApiError::NotFound("Agent not found".to_string()));
        }

        let agent = self.get_owned_agent(auth_user, id).await?;
        tracing::info!("Agent {} is_active={}", agent.id, agent.is_active);
        Ok(agent)
    }

    /// Snippet a site owner pastes into their pages.
    pub async fn widget_snippet(
        &self,
        auth_user: &AuthenticatedUser,
        id: &str,
    ) -> ApiResult<WidgetSnippetResponse> {
        let agent = self.get_owned_agent(auth_user, id).await?;
        let config = serde_json::json!({
            "agentId": agent.id,
            "apiUrl": format!("{}/api", self.widget_base_url),
            "theme": agent.widget.theme,
            "primaryColor": agent.widget.primary_color,
            "position": agent.widget.position,
            "welcomeMessage": agent.widget.welcome_message,
            "placeholder": agent.widget.placeholder,
            "title": agent.widget.title,
        });

        let widget_code = format!(
            r#"<!-- Lyzr Support Chat Widget -->
<script>
  (function() {{
    window.LyzrWidgetConfig = {config};
    var script = document.createElement('script');
    script.src = '{base}/api/widget/{id}/widget.js';
    script.async = true;
    document.head.appendChild(script);
  }})();
</script>"#,
            config = script_json(&config),
            base = self.widget_base_url,
            id = agent.id,
        );

        Ok(WidgetSnippetResponse {
            widget_code,
            agent_id: agent.id,
        })
    }
}
