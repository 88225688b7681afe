use serde::{Deserialize, Serialize};

use crate::domain::entities::{Agent, WidgetPosition, WidgetTheme};

pub const WIDGET_SUBTITLE: &str = "We're here to help";

/// Configuration the embedded script boots with.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub welcome_message: String,
    pub placeholder: String,
    pub theme: WidgetTheme,
    pub primary_color: String,
    pub position: WidgetPosition,
}

impl WidgetConfig {
    pub fn for_agent(agent: &Agent) -> Self {
        let title = if agent.widget.title.trim().is_empty() {
            agent.name.clone()
        } else {
            agent.widget.title.clone()
        };
        Self {
            agent_id: agent.id.clone(),
            api_url: None,
            title,
            subtitle: None,
            welcome_message: agent.widget.welcome_message.clone(),
            placeholder: agent.widget.placeholder.clone(),
            theme: agent.widget.theme,
            primary_color: agent.widget.primary_color.clone(),
            position: agent.widget.position,
        }
    }

    /// Variant injected into the served script.
    pub fn for_script(agent: &Agent, backend_url: &str) -> Self {
        Self {
            api_url: Some(format!("{}/api", backend_url)),
            subtitle: Some(WIDGET_SUBTITLE.to_string()),
            ..Self::for_agent(agent)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WidgetConfigResponse {
    pub config: WidgetConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedCodeResponse {
    pub embed_code: String,
    pub agent_id: String,
    pub widget_url: String,
}

/// Page view beacon; the fields are informational only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageViewRequest {
    pub url: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRequest {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrackingResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CreateAgentRequest, LyzrConfig};

    fn agent() -> Agent {
        Agent::new(
            "owner".to_string(),
            CreateAgentRequest {
                name: "Helpdesk".to_string(),
                description: None,
                lyzr_config: LyzrConfig {
                    agent_id: "lyzr-1".to_string(),
                    api_endpoint: "https://agent.example.com/chat".to_string(),
                    api_key: "key".to_string(),
                },
                widget: None,
                domains: None,
            },
        )
    }

    #[test]
    fn test_public_config_omits_script_fields() {
        let value = serde_json::to_value(WidgetConfig::for_agent(&agent())).unwrap();
        assert!(value.get("apiUrl").is_none());
        assert!(value.get("subtitle").is_none());
        assert_eq!(value["position"], "bottom-right");
    }

    #[test]
    fn test_script_config_points_at_backend_api() {
        let config = WidgetConfig::for_script(&agent(), "https://desk.example.com");
        assert_eq!(config.api_url.as_deref(), Some("https://desk.example.com/api"));
        assert_eq!(config.subtitle.as_deref(), Some(WIDGET_SUBTITLE));
    }

    #[test]
    fn test_interaction_type_field() {
        let request: InteractionRequest =
            serde_json::from_str(r#"{"type":"chat_opened","sessionId":"s-1"}"#).unwrap();
        assert_eq!(request.kind, "chat_opened");
        assert_eq!(request.session_id.as_deref(), Some("s-1"));
    }
}
