use crate::domain::entities::{
    DailySatisfaction, EngagementStats, GroupCount, PerformanceMetrics, RecentFeedback, Ticket,
    TicketFilter, TicketMessage, TicketOverview, UserTicketStats,
};
use crate::infrastructure::http::middleware::error::ApiResult;
use async_trait::async_trait;

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn create_ticket(&self, ticket: &Ticket) -> ApiResult<()>;
    async fn get_ticket_by_id(&self, id: &str) -> ApiResult<Option<Ticket>>;
    /// Only returns the ticket when its agent belongs to `owner_id`
    async fn get_owned_ticket(&self, id: &str, owner_id: &str) -> ApiResult<Option<Ticket>>;
    async fn get_ticket_by_session(&self, session_id: &str) -> ApiResult<Option<Ticket>>;
    async fn list_tickets(&self, filter: &TicketFilter) -> ApiResult<(Vec<Ticket>, i64)>;
    /// Persist the scalar columns; messages are appended separately
    async fn update_ticket(&self, ticket: &Ticket) -> ApiResult<()>;
    async fn delete_ticket(&self, id: &str, owner_id: &str) -> ApiResult<bool>;

    /// Append one message, bump `interactions` and, for the first agent
    /// reply, record `response_time`. Returns the stored message.
    async fn add_message(
        &self,
        ticket_id: &str,
        message: &TicketMessage,
        response_time: Option<f64>,
    ) -> ApiResult<TicketMessage>;

    /// Find-or-create the ticket for `ticket.session_id` and append the
    /// exchange. Returns the ticket id and whether it was created.
    async fn record_chat_exchange(
        &self,
        ticket: &Ticket,
        messages: &[TicketMessage],
    ) -> ApiResult<(String, bool)>;

    // Dashboard analytics, scoped to an agent owner
    async fn ticket_overview(&self, owner_id: &str) -> ApiResult<TicketOverview>;
    async fn count_by_priority(&self, owner_id: &str) -> ApiResult<Vec<GroupCount>>;
    async fn top_categories(&self, owner_id: &str, limit: i64) -> ApiResult<Vec<GroupCount>>;

    // Per-user views; `owner_id` of None means unscoped
    async fn ticket_user_ids(&self, owner_id: &str) -> ApiResult<Vec<String>>;
    async fn user_ticket_stats(
        &self,
        user_id: &str,
        owner_id: Option<&str>,
    ) -> ApiResult<UserTicketStats>;
    async fn recent_user_tickets(
        &self,
        user_id: &str,
        owner_id: Option<&str>,
        limit: i64,
    ) -> ApiResult<Vec<Ticket>>;
    async fn engagement_stats(&self, owner_id: Option<&str>) -> ApiResult<EngagementStats>;

    // Per-agent optimization figures
    async fn agent_performance(&self, agent_id: &str) -> ApiResult<PerformanceMetrics>;
    async fn agent_categories(&self, agent_id: &str, limit: i64) -> ApiResult<Vec<GroupCount>>;
    async fn unresolved_categories(&self, agent_id: &str) -> ApiResult<Vec<GroupCount>>;
    async fn satisfaction_trend(
        &self,
        agent_id: &str,
        since: &str,
    ) -> ApiResult<Vec<DailySatisfaction>>;
    async fn recent_feedback(&self, agent_id: &str, limit: i64) -> ApiResult<Vec<RecentFeedback>>;
    async fn low_satisfaction_count(&self, agent_id: &str) -> ApiResult<i64>;
}
