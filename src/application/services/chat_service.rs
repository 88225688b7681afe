use std::sync::Arc;

use chrono::Utc;

use crate::domain::entities::*;
use crate::domain::ports::agent_repository::AgentRepository;
use crate::domain::ports::chat_provider::ChatProvider;
use crate::domain::ports::ticket_repository::TicketRepository;
use crate::domain::services::{caller_identity, mint_session_id};
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AuthenticatedUser};
use crate::infrastructure::observability::{
    CHAT_MESSAGES_TOTAL, TICKETS_OPENED_TOTAL, UPSTREAM_FAILURES_TOTAL,
};
use crate::shared::utils::now_timestamp;

/// Relays widget messages to the agent's upstream endpoint and keeps
/// one ticket per chat session.
#[derive(Clone)]
pub struct ChatService {
    agent_repo: Arc<dyn AgentRepository>,
    ticket_repo: Arc<dyn TicketRepository>,
    provider: Arc<dyn ChatProvider>,
}

impl ChatService {
    pub fn new(
        agent_repo: Arc<dyn AgentRepository>,
        ticket_repo: Arc<dyn TicketRepository>,
        provider: Arc<dyn ChatProvider>,
    ) -> Self {
        Self {
            agent_repo,
            ticket_repo,
            provider,
        }
    }

    #[tracing::instrument(skip(self, request), fields(agent_id = %request.agent_id))]
    pub async fn send_message(
        &self,
        caller_ip: Option<&str>,
        mut request: ChatMessageRequest,
    ) -> ApiResult<ChatMessageResponse> {
        request.validate()?;

        let agent = self
            .agent_repo
            .get_agent_by_id(&request.agent_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Agent not found".to_string()))?;
        if !agent.is_active {
            return Err(ApiError::BadRequest("Agent is not active".to_string()));
        }

        let caller = caller_identity(caller_ip);
        let supplied_session = request.supplied_session_id().map(str::to_string);
        let is_new_chat = supplied_session.is_none();
        let session_id = supplied_session.unwrap_or_else(|| {
            mint_session_id(&agent.lyzr_config.agent_id, &caller, Utc::now())
        });

        let upstream_request = UpstreamChatRequest {
            user_id: caller,
            agent_id: agent.lyzr_config.agent_id.clone(),
            session_id: session_id.clone(),
            message: request.message.clone(),
        };

        let reply = match self
            .provider
            .send_message(
                &agent.lyzr_config.api_endpoint,
                &agent.lyzr_config.api_key,
                &upstream_request,
            )
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                metrics::counter!(UPSTREAM_FAILURES_TOTAL).increment(1);
                tracing::error!("Chat relay failed for agent {}: {}", agent.id, e);
                return Err(ApiError::Upstream("Failed to process message".to_string()));
            }
        };

        let ticket = Ticket::for_chat_session(
            agent.id.clone(),
            session_id.clone(),
            &request.message,
            request.customer_info.take().unwrap_or_default(),
        );
        let exchange = [
            TicketMessage::new(request.message, MessageSender::User, None),
            TicketMessage::new(reply.response.clone(), MessageSender::Agent, None),
        ];
        let (_, created) = self
            .ticket_repo
            .record_chat_exchange(&ticket, &exchange)
            .await?;
        if created {
            metrics::counter!(TICKETS_OPENED_TOTAL).increment(1);
        }

        let now = now_timestamp();
        self.agent_repo
            .record_chat_activity(&agent.id, is_new_chat, &now)
            .await?;
        metrics::counter!(CHAT_MESSAGES_TOTAL).increment(1);

        Ok(ChatMessageResponse {
            message: reply.response,
            session_id,
            agent_id: agent.id,
            timestamp: now,
        })
    }

    /// Send a fixed test message through an owned agent. Nothing is stored.
    #[tracing::instrument(skip(self, auth_user), fields(caller = %auth_user.id()))]
    pub async fn test_connection(
        &self,
        auth_user: &AuthenticatedUser,
        agent_id: &str,
    ) -> ApiResult<TestConnectionResponse> {
        let agent = self
            .agent_repo
            .get_owned_agent(agent_id, auth_user.id())
            .await?
            .ok_or_else(|| ApiError::NotFound("Agent not found".to_string()))?;

        let session_id = mint_session_id(&agent.lyzr_config.agent_id, auth_user.id(), Utc::now());
        let upstream_request = UpstreamChatRequest {
            user_id: auth_user.id().to_string(),
            agent_id: agent.lyzr_config.agent_id.clone(),
            session_id: session_id.clone(),
            message: TEST_CONNECTION_MESSAGE.to_string(),
        };

        match self
            .provider
            .send_message(
                &agent.lyzr_config.api_endpoint,
                &agent.lyzr_config.api_key,
                &upstream_request,
            )
            .await
        {
            Ok(reply) => Ok(TestConnectionResponse {
                response: reply.response,
                session_id,
            }),
            Err(e) => {
                metrics::counter!(UPSTREAM_FAILURES_TOTAL).increment(1);
                tracing::warn!("Connection test failed for agent {}: {}", agent.id, e);
                Err(ApiError::Upstream(
                    "Failed to test agent connection".to_string(),
                ))
            }
        }
    }
}
