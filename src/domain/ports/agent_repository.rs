use crate::domain::entities::{Agent, InteractionKind, OptimizationSettings, TrainingEntry};
use crate::infrastructure::http::middleware::error::ApiResult;
use async_trait::async_trait;

#[async_trait]
pub trait AgentRepository: Send + Sync {
    async fn create_agent(&self, agent: &Agent) -> ApiResult<()>;
    async fn get_agent_by_id(&self, id: &str) -> ApiResult<Option<Agent>>;
    /// Only returns the agent when `owner_id` owns it
    async fn get_owned_agent(&self, id: &str, owner_id: &str) -> ApiResult<Option<Agent>>;
    async fn list_agents_by_owner(&self, owner_id: &str) -> ApiResult<Vec<Agent>>;
    async fn lyzr_agent_id_exists(
        &self,
        lyzr_agent_id: &str,
        exclude_agent_id: Option<&str>,
    ) -> ApiResult<bool>;
    async fn update_agent(&self, agent: &Agent) -> ApiResult<()>;
    async fn delete_agent(&self, id: &str, owner_id: &str) -> ApiResult<bool>;
    /// Flip `is_active` in a single statement
    async fn toggle_agent_active(&self, id: &str, owner_id: &str, updated_at: &str)
        -> ApiResult<bool>;

    // Analytics counters
    async fn record_chat_activity(&self, id: &str, new_chat: bool, at: &str) -> ApiResult<()>;
    /// Count a widget script load; `last_seen` is left to the view beacon
    async fn record_script_load(&self, id: &str) -> ApiResult<()>;
    async fn record_page_view(&self, id: &str, at: &str) -> ApiResult<()>;
    async fn record_widget_interaction(
        &self,
        id: &str,
        kind: InteractionKind,
        at: &str,
    ) -> ApiResult<()>;

    // Optimization and training data
    async fn update_optimization(
        &self,
        id: &str,
        settings: &OptimizationSettings,
        updated_at: &str,
    ) -> ApiResult<()>;
    /// Appends entries, stamps the training update and returns the new total
    async fn add_training_entries(
        &self,
        agent_id: &str,
        entries: &[TrainingEntry],
        at: &str,
    ) -> ApiResult<i64>;
    async fn list_training_entries(
        &self,
        agent_id: &str,
        category: Option<&str>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> ApiResult<(Vec<TrainingEntry>, i64)>;
    async fn training_categories(&self, agent_id: &str) -> ApiResult<Vec<String>>;
    async fn count_training_entries(&self, agent_id: &str) -> ApiResult<i64>;
}
