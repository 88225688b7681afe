use crate::domain::entities::{UpstreamChatReply, UpstreamChatRequest};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LyzrError {
    #[error("upstream request timed out")]
    Timeout,
    #[error("upstream transport error: {0}")]
    Transport(String),
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("upstream reply could not be decoded: {0}")]
    Decode(String),
}

/// Conversational AI backend the chat relay forwards to.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn send_message(
        &self,
        endpoint: &str,
        api_key: &str,
        request: &UpstreamChatRequest,
    ) -> Result<UpstreamChatReply, LyzrError>;
}
