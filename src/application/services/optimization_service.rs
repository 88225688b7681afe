use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::entities::*;
use crate::domain::ports::agent_repository::AgentRepository;
use crate::domain::ports::ticket_repository::TicketRepository;
use crate::domain::services::{build_recommendations, round2};
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AuthenticatedUser};
use crate::shared::utils::{format_timestamp, now_timestamp};

const TREND_DAYS: i64 = 30;
const TOP_CATEGORIES: i64 = 10;
const RECENT_FEEDBACK: i64 = 20;
const DEFAULT_TRAINING_PAGE_SIZE: i64 = 50;

/// Per-agent performance reporting, tuning settings and training data.
#[derive(Clone)]
pub struct OptimizationService {
    agent_repo: Arc<dyn AgentRepository>,
    ticket_repo: Arc<dyn TicketRepository>,
}

impl OptimizationService {
    pub fn new(agent_repo: Arc<dyn AgentRepository>, ticket_repo: Arc<dyn TicketRepository>) -> Self {
        Self {
            agent_repo,
            ticket_repo,
        }
    }

    async fn get_owned_agent(&self, auth_user: &AuthenticatedUser, id: &str) -> ApiResult<Agent> {
        self.agent_repo
            .get_owned_agent(id, auth_user.id())
            .await?
            .ok_or_else(|| ApiError::NotFound("Agent not found".to_string()))
    }

    #[tracing::instrument(skip(self, auth_user))]
    pub async fn report(&self, auth_user: &AuthenticatedUser, id: &str) -> ApiResult<OptimizationReport> {
        let agent = self.get_owned_agent(auth_user, id).await?;

        let mut performance = self.ticket_repo.agent_performance(&agent.id).await?;
        performance.resolution_rate = round2(performance.resolution_rate);

        let since = format_timestamp(Utc::now() - Duration::days(TREND_DAYS));
        let insights = OptimizationInsights {
            common_categories: self
                .ticket_repo
                .agent_categories(&agent.id, TOP_CATEGORIES)
                .await?,
            satisfaction_trend: self.ticket_repo.satisfaction_trend(&agent.id, &since).await?,
            recent_feedback: self
                .ticket_repo
                .recent_feedback(&agent.id, RECENT_FEEDBACK)
                .await?,
        };

        Ok(OptimizationReport {
            optimization: agent.optimization.clone().unwrap_or_default(),
            agent: AgentSummary {
                id: agent.id,
                name: agent.name,
                description: agent.description,
                is_active: agent.is_active,
                analytics: agent.analytics,
            },
            performance,
            insights,
        })
    }

    /// Replace the agent's optimization settings.
    pub async fn update_settings(
        &self,
        auth_user: &AuthenticatedUser,
        id: &str,
        request: UpdateOptimizationRequest,
    ) -> ApiResult<OptimizationUpdateResponse> {
        request.validate()?;

        let mut agent = self.get_owned_agent(auth_user, id).await?;
        let settings = request.into_settings();
        let now = now_timestamp();
        self.agent_repo
            .update_optimization(&agent.id, &settings, &now)
            .await?;

        agent.optimization = Some(settings.clone());
        agent.updated_at = now;
        Ok(OptimizationUpdateResponse {
            agent,
            optimization: settings,
        })
    }

    #[tracing::instrument(skip(self, auth_user, upload), fields(caller = %auth_user.id()))]
    pub async fn upload_training_data(
        &self,
        auth_user: &AuthenticatedUser,
        id: &str,
        upload: TrainingDataUpload,
    ) -> ApiResult<TrainingUploadResponse> {
        upload.validate()?;

        let agent = self.get_owned_agent(auth_user, id).await?;
        let now = now_timestamp();
        let entries = upload.into_entries(auth_user.id(), &now);
        let uploaded = entries.len();

        let total = self
            .agent_repo
            .add_training_entries(&agent.id, &entries, &now)
            .await?;
        tracing::info!("Uploaded {} training examples to agent {}", uploaded, agent.id);

        let agent = self.get_owned_agent(auth_user, id).await?;
        Ok(TrainingUploadResponse {
            message: format!("Successfully uploaded {} training examples", uploaded),
            agent,
            training_data_count: total,
        })
    }

    pub async fn list_training_data(
        &self,
        auth_user: &AuthenticatedUser,
        id: &str,
        query: TrainingDataQuery,
    ) -> ApiResult<TrainingDataResponse> {
        let agent = self.get_owned_agent(auth_user, id).await?;
        let (page, limit, offset) =
            page_window(query.page, query.limit, DEFAULT_TRAINING_PAGE_SIZE);

        let category = query.category.as_deref().filter(|c| !c.is_empty());
        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let (training_data, total) = self
            .agent_repo
            .list_training_entries(&agent.id, category, search, limit, offset)
            .await?;
        let categories = self.agent_repo.training_categories(&agent.id).await?;

        Ok(TrainingDataResponse {
            pagination: PaginationMetadata::new(training_data.len(), total, page, limit),
            training_data,
            categories,
        })
    }

    pub async fn recommendations(
        &self,
        auth_user: &AuthenticatedUser,
        id: &str,
    ) -> ApiResult<RecommendationsResponse> {
        let agent = self.get_owned_agent(auth_user, id).await?;

        let mut metrics = self.ticket_repo.agent_performance(&agent.id).await?;
        let unresolved_categories = self.ticket_repo.unresolved_categories(&agent.id).await?;
        let recommendations = build_recommendations(&metrics, &unresolved_categories);
        metrics.resolution_rate = round2(metrics.resolution_rate);

        Ok(RecommendationsResponse {
            metrics,
            recommendations,
            insights: RecommendationInsights {
                unresolved_categories,
                low_satisfaction_count: self.ticket_repo.low_satisfaction_count(&agent.id).await?,
                training_data_count: self.agent_repo.count_training_entries(&agent.id).await?,
            },
        })
    }
}
