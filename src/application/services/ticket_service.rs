use std::sync::Arc;

use crate::domain::entities::*;
use crate::domain::ports::agent_repository::AgentRepository;
use crate::domain::ports::ticket_repository::TicketRepository;
use crate::domain::ports::user_repository::UserRepository;
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AuthenticatedUser};
use crate::shared::utils::{minutes_between, now_timestamp};

const DEFAULT_TICKET_PAGE_SIZE: i64 = 10;
const TOP_CATEGORIES: i64 = 10;

#[derive(Clone)]
pub struct TicketService {
    ticket_repo: Arc<dyn TicketRepository>,
    agent_repo: Arc<dyn AgentRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl TicketService {
    pub fn new(
        ticket_repo: Arc<dyn TicketRepository>,
        agent_repo: Arc<dyn AgentRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            ticket_repo,
            agent_repo,
            user_repo,
        }
    }

    async fn get_owned_ticket(&self, auth_user: &AuthenticatedUser, id: &str) -> ApiResult<Ticket> {
        self.ticket_repo
            .get_owned_ticket(id, auth_user.id())
            .await?
            .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))
    }

    /// Create a ticket from the dashboard or from an anonymous widget form.
    #[tracing::instrument(skip_all)]
    pub async fn create_ticket(
        &self,
        auth_user: Option<&AuthenticatedUser>,
        mut request: CreateTicketRequest,
    ) -> ApiResult<Ticket> {
        request.validate()?;

        let agent = self
            .agent_repo
            .get_agent_by_id(&request.agent_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Agent not found".to_string()))?;

        if let Some(user) = auth_user {
            if agent.owner_id != user.id() {
                return Err(ApiError::NotFound("Agent not found".to_string()));
            }
        }

        let mut ticket = Ticket::new(
            agent.id,
            request.title.trim().to_string(),
            request.description.trim().to_string(),
        );
        ticket.priority = request.priority.unwrap_or_default();
        ticket.category = request.category;
        ticket.session_id = request.session_id.filter(|s| !s.trim().is_empty());
        ticket.tags = request.tags.unwrap_or_default();
        ticket.customer_info = request.customer_info.unwrap_or_default();
        if let Some(user) = auth_user {
            ticket.user_id = Some(user.id().to_string());
            ticket.assigned_to = Some(user.id().to_string());
        }

        self.ticket_repo.create_ticket(&ticket).await?;
        Ok(ticket)
    }

    pub async fn list_tickets(
        &self,
        auth_user: &AuthenticatedUser,
        query: TicketListQuery,
    ) -> ApiResult<TicketListResponse> {
        let (page, limit, offset) =
            page_window(query.page, query.limit, DEFAULT_TICKET_PAGE_SIZE);

        let filter = TicketFilter {
            owner_id: auth_user.id().to_string(),
            status: query.status,
            priority: query.priority,
            category: query.category,
            limit,
            offset,
        };
        let (tickets, total) = self.ticket_repo.list_tickets(&filter).await?;

        Ok(TicketListResponse {
            pagination: PaginationMetadata::new(tickets.len(), total, page, limit),
            tickets,
        })
    }

    pub async fn analytics(&self, auth_user: &AuthenticatedUser) -> ApiResult<TicketAnalyticsResponse> {
        let owner_id = auth_user.id();
        Ok(TicketAnalyticsResponse {
            overview: self.ticket_repo.ticket_overview(owner_id).await?,
            by_priority: self.ticket_repo.count_by_priority(owner_id).await?,
            by_category: self
                .ticket_repo
                .top_categories(owner_id, TOP_CATEGORIES)
                .await?,
        })
    }

    pub async fn get_ticket(&self, auth_user: &AuthenticatedUser, id: &str) -> ApiResult<Ticket> {
        self.get_owned_ticket(auth_user, id).await
    }

    #[tracing::instrument(skip(self, auth_user, request), fields(caller = %auth_user.id()))]
    pub async fn update_ticket(
        &self,
        auth_user: &AuthenticatedUser,
        id: &str,
        request: UpdateTicketRequest,
    ) -> ApiResult<Ticket> {
        request.validate()?;

        let mut ticket = self.get_owned_ticket(auth_user, id).await?;
        let now = now_timestamp();

        if let Some(assignee) = &request.assigned_to {
            if self.user_repo.get_user_by_id(assignee).await?.is_none() {
                return Err(ApiError::BadRequest("Assignee not found".to_string()));
            }
        }

        if let Some(title) = request.title {
            ticket.title = title.trim().to_string();
        }
        if let Some(description) = request.description {
            ticket.description = description.trim().to_string();
        }
        if let Some(priority) = request.priority {
            ticket.priority = priority;
        }
        if let Some(category) = request.category {
            ticket.category = Some(category);
        }
        if let Some(assignee) = request.assigned_to {
            ticket.assigned_to = Some(assignee);
        }
        if let Some(tags) = request.tags {
            ticket.tags = tags;
        }
        if let Some(satisfaction) = request.satisfaction {
            ticket.analytics.satisfaction = Some(satisfaction);
        }
        if let Some(resolution) = request.resolution {
            ticket.resolution = Some(Resolution {
                summary: resolution.summary,
                resolved_by: Some(auth_user.id().to_string()),
                resolved_at: Some(now.clone()),
            });
        }
        if let Some(status) = request.status {
            if status.is_finished() && ticket.analytics.resolution_time.is_none() {
                ticket.analytics.resolution_time = minutes_between(&ticket.created_at, &now);
            }
            ticket.status = status;
        }
        ticket.updated_at = now;

        self.ticket_repo.update_ticket(&ticket).await?;
        Ok(ticket)
    }

    pub async fn delete_ticket(&self, auth_user: &AuthenticatedUser, id: &str) -> ApiResult<()> {
        if !self.ticket_repo.delete_ticket(id, auth_user.id()).await? {
            return Err(ApiError::NotFound("Ticket not found".to_string()));
        }

        tracing::info!("Ticket {} deleted by {}", id, auth_user.id());
        Ok(())
    }

    /// Append a dashboard message; the first agent reply records the
    /// ticket's response time.
    pub async fn add_message(
        &self,
        auth_user: &AuthenticatedUser,
        id: &str,
        request: AddMessageRequest,
    ) -> ApiResult<AddMessageResponse> {
        request.validate()?;

        let ticket = self.get_owned_ticket(auth_user, id).await?;
        let sender = request.sender.unwrap_or_default();
        let message = TicketMessage::new(request.content.trim().to_string(), sender, request.metadata);

        let response_time = if sender == MessageSender::Agent && ticket.analytics.response_time.is_none()
        {
            minutes_between(&ticket.created_at, &message.timestamp)
        } else {
            None
        };

        let message = self
            .ticket_repo
            .add_message(&ticket.id, &message, response_time)
            .await?;

        let ticket = self.get_owned_ticket(auth_user, id).await?;
        Ok(AddMessageResponse { ticket, message })
    }
}
