use serde::{Deserialize, Serialize};

use crate::domain::entities::CustomerInfo;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::shared::utils::FieldErrors;

pub const TEST_CONNECTION_MESSAGE: &str = "Hello, this is a test message.";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub agent_id: String,
    pub session_id: Option<String>,
    pub customer_info: Option<CustomerInfo>,
}

impl ChatMessageRequest {
    pub fn validate(&mut self) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        errors.required("message", &self.message, "Message is required");
        errors.required("agentId", &self.agent_id, "Agent ID is required");
        if let Some(info) = self.customer_info.as_mut() {
            info.validate(&mut errors);
        }
        errors.into_result()
    }

    /// An empty session id is treated as absent.
    pub fn supplied_session_id(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub message: String,
    pub session_id: String,
    pub agent_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionResponse {
    pub response: String,
    pub session_id: String,
}

/// Payload sent to the upstream inference endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamChatRequest {
    pub user_id: String,
    pub agent_id: String,
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamChatReply {
    pub response: String,
    #[serde(default)]
    pub module_outputs: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fail_validation() {
        let mut request: ChatMessageRequest = serde_json::from_str(r#"{"message": ""}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_blank_session_id_counts_as_absent() {
        let request: ChatMessageRequest =
            serde_json::from_str(r#"{"message":"hi","agentId":"a","sessionId":" "}"#).unwrap();
        assert!(request.supplied_session_id().is_none());
    }

    #[test]
    fn test_upstream_reply_ignores_extra_fields() {
        let reply: UpstreamChatReply =
            serde_json::from_str(r#"{"response":"hello","module_outputs":{"x":1},"extra":true}"#)
                .unwrap();
        assert_eq!(reply.response, "hello");
        assert!(reply.module_outputs.is_some());
    }
}
