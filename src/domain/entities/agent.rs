use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{GroupCount, PaginationMetadata};
use crate::shared::utils::{
    is_allowed_domain_pattern, is_hex_color, is_http_url, now_timestamp, FieldErrors,
};
use crate::infrastructure::http::middleware::error::ApiResult;

pub const DEFAULT_PRIMARY_COLOR: &str = "#3b82f6";
pub const DEFAULT_WELCOME_MESSAGE: &str = "Hi! How can I help you today?";
pub const DEFAULT_PLACEHOLDER: &str = "Type your message...";
pub const DEFAULT_WIDGET_TITLE: &str = "Chat Support";
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "I'm not sure about that. Let me connect you with a human agent.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WidgetTheme {
    #[default]
    Light,
    Dark,
}

impl WidgetTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetTheme::Light => "light",
            WidgetTheme::Dark => "dark",
        }
    }
}

impl std::str::FromStr for WidgetTheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(WidgetTheme::Light),
            "dark" => Ok(WidgetTheme::Dark),
            _ => Err(format!("Invalid widget theme: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetPosition {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl WidgetPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetPosition::BottomRight => "bottom-right",
            WidgetPosition::BottomLeft => "bottom-left",
            WidgetPosition::TopRight => "top-right",
            WidgetPosition::TopLeft => "top-left",
        }
    }
}

impl std::str::FromStr for WidgetPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bottom-right" => Ok(WidgetPosition::BottomRight),
            "bottom-left" => Ok(WidgetPosition::BottomLeft),
            "top-right" => Ok(WidgetPosition::TopRight),
            "top-left" => Ok(WidgetPosition::TopLeft),
            _ => Err(format!("Invalid widget position: {}", s)),
        }
    }
}

/// Credentials and endpoint of the upstream Lyzr agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyzrConfig {
    pub agent_id: String,
    pub api_endpoint: String,
    pub api_key: String,
}

impl LyzrConfig {
    fn validate(&self, errors: &mut FieldErrors) {
        errors.required("lyzrConfig.agentId", &self.agent_id, "Lyzr Agent ID is required");
        if !is_http_url(&self.api_endpoint) {
            errors.push(
                "lyzrConfig.apiEndpoint",
                "Please provide a valid API endpoint",
            );
        }
        errors.required("lyzrConfig.apiKey", &self.api_key, "API key is required");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    pub theme: WidgetTheme,
    pub primary_color: String,
    pub position: WidgetPosition,
    pub welcome_message: String,
    pub placeholder: String,
    pub title: String,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            theme: WidgetTheme::Light,
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            position: WidgetPosition::BottomRight,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            title: DEFAULT_WIDGET_TITLE.to_string(),
        }
    }
}

/// Partial widget settings as accepted on create/update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettingsInput {
    pub theme: Option<WidgetTheme>,
    pub primary_color: Option<String>,
    pub position: Option<WidgetPosition>,
    pub welcome_message: Option<String>,
    pub placeholder: Option<String>,
    pub title: Option<String>,
}

impl WidgetSettingsInput {
    fn validate(&self, errors: &mut FieldErrors) {
        if let Some(color) = &self.primary_color {
            if !is_hex_color(color) {
                errors.push("widget.primaryColor", "Invalid hex color");
            }
        }
        if let Some(message) = &self.welcome_message {
            errors.max_len("widget.welcomeMessage", message, 200);
        }
        if let Some(placeholder) = &self.placeholder {
            errors.max_len("widget.placeholder", placeholder, 100);
        }
        if let Some(title) = &self.title {
            errors.max_len("widget.title", title, 50);
        }
    }

    /// Overlay the provided fields on top of `base`.
    pub fn apply_to(self, base: &mut WidgetSettings) {
        if let Some(theme) = self.theme {
            base.theme = theme;
        }
        if let Some(color) = self.primary_color {
            base.primary_color = color;
        }
        if let Some(position) = self.position {
            base.position = position;
        }
        if let Some(message) = self.welcome_message {
            base.welcome_message = message;
        }
        if let Some(placeholder) = self.placeholder {
            base.placeholder = placeholder;
        }
        if let Some(title) = self.title {
            base.title = title;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAnalytics {
    pub total_chats: i64,
    pub total_messages: i64,
    pub page_views: i64,
    pub last_used: Option<String>,
    pub last_seen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationSettings {
    pub enable_auto_learning: bool,
    pub confidence_threshold: f64,
    /// Seconds
    pub response_time_target: f64,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub fallback_message: String,
}

impl Default for OptimizationSettings {
    fn default() -> Self {
        Self {
            enable_auto_learning: false,
            confidence_threshold: 0.8,
            response_time_target: 30.0,
            categories: Vec::new(),
            keywords: Vec::new(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOptimizationRequest {
    pub enable_auto_learning: Option<bool>,
    pub confidence_threshold: Option<f64>,
    pub response_time_target: Option<f64>,
    pub categories: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub fallback_message: Option<String>,
}

impl UpdateOptimizationRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(threshold) = self.confidence_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                errors.push("confidenceThreshold", "Must be between 0 and 1");
            }
        }
        if let Some(target) = self.response_time_target {
            if target < 1.0 {
                errors.push("responseTimeTarget", "Must be at least 1 second");
            }
        }
        if let Some(categories) = &self.categories {
            errors.each_max_len("categories", categories, 100);
        }
        if let Some(keywords) = &self.keywords {
            errors.each_max_len("keywords", keywords, 50);
        }
        if let Some(fallback) = &self.fallback_message {
            errors.max_len("fallbackMessage", fallback, 200);
        }
        errors.into_result()
    }

    /// Build the stored settings; omitted fields take their defaults.
    pub fn into_settings(self) -> OptimizationSettings {
        let defaults = OptimizationSettings::default();
        OptimizationSettings {
            enable_auto_learning: self
                .enable_auto_learning
                .unwrap_or(defaults.enable_auto_learning),
            confidence_threshold: self
                .confidence_threshold
                .unwrap_or(defaults.confidence_threshold),
            response_time_target: self
                .response_time_target
                .unwrap_or(defaults.response_time_target),
            categories: self.categories.unwrap_or(defaults.categories),
            keywords: self.keywords.unwrap_or(defaults.keywords),
            fallback_message: self.fallback_message.unwrap_or(defaults.fallback_message),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    #[serde(rename = "owner")]
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub lyzr_config: LyzrConfig,
    pub widget: WidgetSettings,
    pub domains: Vec<String>,
    pub is_active: bool,
    pub analytics: AgentAnalytics,
    pub optimization: Option<OptimizationSettings>,
    pub last_training_update: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Agent {
    pub fn new(owner_id: String, request: CreateAgentRequest) -> Self {
        let now = now_timestamp();
        let mut widget = WidgetSettings::default();
        if let Some(input) = request.widget {
            input.apply_to(&mut widget);
        }

        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            name: request.name.trim().to_string(),
            description: request.description.map(|d| d.trim().to_string()),
            lyzr_config: request.lyzr_config,
            widget,
            domains: request.domains.unwrap_or_default(),
            is_active: true,
            analytics: AgentAnalytics::default(),
            optimization: None,
            last_training_update: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Apply a partial update. The upstream config, when present, replaces
    /// the stored one as a whole.
    pub fn apply_update(&mut self, request: UpdateAgentRequest) {
        if let Some(name) = request.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            self.description = Some(description.trim().to_string());
        }
        if let Some(config) = request.lyzr_config {
            self.lyzr_config = config;
        }
        if let Some(widget) = request.widget {
            widget.apply_to(&mut self.widget);
        }
        if let Some(domains) = request.domains {
            self.domains = domains;
        }
        self.updated_at = now_timestamp();
    }
}

fn validate_agent_fields(
    errors: &mut FieldErrors,
    name: Option<&str>,
    description: Option<&str>,
    lyzr_config: Option<&LyzrConfig>,
    widget: Option<&WidgetSettingsInput>,
    domains: Option<&[String]>,
) {
    if let Some(name) = name {
        errors.len_between("name", name, 2, 100);
    }
    if let Some(description) = description {
        errors.max_len("description", description, 500);
    }
    if let Some(config) = lyzr_config {
        config.validate(errors);
    }
    if let Some(widget) = widget {
        widget.validate(errors);
    }
    if let Some(domains) = domains {
        for (index, domain) in domains.iter().enumerate() {
            if !is_allowed_domain_pattern(domain) {
                errors.push(
                    &format!("domains[{}]", index),
                    "Please provide valid domain names",
                );
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    pub name: String,
    pub description: Option<String>,
    pub lyzr_config: LyzrConfig,
    pub widget: Option<WidgetSettingsInput>,
    pub domains: Option<Vec<String>>,
}

impl CreateAgentRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        validate_agent_fields(
            &mut errors,
            Some(&self.name),
            self.description.as_deref(),
            Some(&self.lyzr_config),
            self.widget.as_ref(),
            self.domains.as_deref(),
        );
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub lyzr_config: Option<LyzrConfig>,
    pub widget: Option<WidgetSettingsInput>,
    pub domains: Option<Vec<String>>,
}

impl UpdateAgentRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        validate_agent_fields(
            &mut errors,
            self.name.as_deref(),
            self.description.as_deref(),
            self.lyzr_config.as_ref(),
            self.widget.as_ref(),
            self.domains.as_deref(),
        );
        errors.into_result()
    }
}

#[derive(Debug, Serialize)]
pub struct AgentListResponse {
    pub count: usize,
    pub agents: Vec<Agent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSnippetResponse {
    pub widget_code: String,
    pub agent_id: String,
}

/// Widget events reported by the embedded script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    ChatOpened,
    MessageSent,
    Other,
}

impl InteractionKind {
    pub fn parse(value: &str) -> Self {
        match value {
            "chat_opened" => InteractionKind::ChatOpened,
            "message_sent" => InteractionKind::MessageSent,
            _ => InteractionKind::Other,
        }
    }
}

// Training data

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingEntry {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub uploaded_by: String,
    pub uploaded_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingQuestionInput {
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingDataUpload {
    pub questions: Vec<TrainingQuestionInput>,
}

impl TrainingDataUpload {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        if self.questions.is_empty() {
            errors.push("questions", "At least one Q&A pair is required");
        }
        for (index, item) in self.questions.iter().enumerate() {
            let prefix = format!("questions[{}]", index);
            errors.required(
                &format!("{}.question", prefix),
                &item.question,
                "Question is required",
            );
            errors.max_len(&format!("{}.question", prefix), &item.question, 500);
            errors.required(
                &format!("{}.answer", prefix),
                &item.answer,
                "Answer is required",
            );
            errors.max_len(&format!("{}.answer", prefix), &item.answer, 2000);
            if let Some(category) = &item.category {
                errors.max_len(&format!("{}.category", prefix), category, 100);
            }
            if let Some(tags) = &item.tags {
                errors.each_max_len(&format!("{}.tags", prefix), tags, 50);
            }
        }
        errors.into_result()
    }

    pub fn into_entries(self, uploaded_by: &str, uploaded_at: &str) -> Vec<TrainingEntry> {
        self.questions
            .into_iter()
            .map(|q| TrainingEntry {
                id: Uuid::new_v4().to_string(),
                question: q.question,
                answer: q.answer,
                category: q.category,
                tags: q.tags.unwrap_or_default(),
                uploaded_by: uploaded_by.to_string(),
                uploaded_at: uploaded_at.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingUploadResponse {
    pub message: String,
    pub agent: Agent,
    pub training_data_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainingDataQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingDataResponse {
    pub training_data: Vec<TrainingEntry>,
    pub categories: Vec<String>,
    pub pagination: PaginationMetadata,
}

// Optimization reporting

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub total_tickets: i64,
    pub avg_response_time: f64,
    pub avg_resolution_time: f64,
    pub avg_satisfaction: f64,
    pub total_interactions: i64,
    pub resolved_tickets: i64,
    pub resolution_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySatisfaction {
    pub date: String,
    pub avg_satisfaction: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFeedback {
    pub id: String,
    pub satisfaction: Option<i64>,
    pub customer_name: Option<String>,
    pub date: String,
    pub last_message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub analytics: AgentAnalytics,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationInsights {
    pub common_categories: Vec<GroupCount>,
    pub satisfaction_trend: Vec<DailySatisfaction>,
    pub recent_feedback: Vec<RecentFeedback>,
}

#[derive(Debug, Serialize)]
pub struct OptimizationReport {
    pub agent: AgentSummary,
    pub performance: PerformanceMetrics,
    pub insights: OptimizationInsights,
    pub optimization: OptimizationSettings,
}

#[derive(Debug, Serialize)]
pub struct OptimizationUpdateResponse {
    pub agent: Agent,
    pub optimization: OptimizationSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Satisfaction,
    ResponseTime,
    ResolutionRate,
    Training,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub priority: RecommendationPriority,
    pub title: String,
    pub description: String,
    pub action: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationInsights {
    pub unresolved_categories: Vec<GroupCount>,
    pub low_satisfaction_count: i64,
    pub training_data_count: i64,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub metrics: PerformanceMetrics,
    pub recommendations: Vec<Recommendation>,
    pub insights: RecommendationInsights,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::middleware::error::ApiError;

    fn create_request() -> CreateAgentRequest {
        CreateAgentRequest {
            name: "Support Bot".to_string(),
            description: None,
            lyzr_config: LyzrConfig {
                agent_id: "lyzr-123".to_string(),
                api_endpoint: "https://agent.example.com/v3/inference/chat/".to_string(),
                api_key: "sk-test".to_string(),
            },
            widget: None,
            domains: None,
        }
    }

    #[test]
    fn test_new_agent_applies_widget_defaults() {
        let agent = Agent::new("owner-1".to_string(), create_request());
        assert!(agent.is_active);
        assert_eq!(agent.widget, WidgetSettings::default());
        assert_eq!(agent.analytics.total_chats, 0);
        assert!(agent.domains.is_empty());
    }

    #[test]
    fn test_partial_widget_input_keeps_other_fields() {
        let mut request = create_request();
        request.widget = Some(WidgetSettingsInput {
            theme: Some(WidgetTheme::Dark),
            ..Default::default()
        });
        let agent = Agent::new("owner-1".to_string(), request);
        assert_eq!(agent.widget.theme, WidgetTheme::Dark);
        assert_eq!(agent.widget.primary_color, DEFAULT_PRIMARY_COLOR);
    }

    #[test]
    fn test_create_validation_reports_fields() {
        let mut request = create_request();
        request.name = "A".to_string();
        request.lyzr_config.api_endpoint = "not-a-url".to_string();
        request.domains = Some(vec!["https://bad".to_string()]);

        match request.validate() {
            Err(ApiError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.clone()).collect();
                assert!(fields.contains(&"name".to_string()));
                assert!(fields.contains(&"lyzrConfig.apiEndpoint".to_string()));
                assert!(fields.contains(&"domains[0]".to_string()));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_widget_position_serializes_kebab_case() {
        let value = serde_json::to_value(WidgetPosition::TopLeft).unwrap();
        assert_eq!(value, "top-left");
    }

    #[test]
    fn test_optimization_defaults_fill_missing_fields() {
        let settings = UpdateOptimizationRequest {
            confidence_threshold: Some(0.5),
            ..Default::default()
        }
        .into_settings();
        assert_eq!(settings.confidence_threshold, 0.5);
        assert_eq!(settings.response_time_target, 30.0);
        assert_eq!(settings.fallback_message, DEFAULT_FALLBACK_MESSAGE);
    }

    #[test]
    fn test_optimization_threshold_range() {
        let request = UpdateOptimizationRequest {
            confidence_threshold: Some(1.5),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_training_upload_requires_questions() {
        let upload = TrainingDataUpload { questions: vec![] };
        assert!(upload.validate().is_err());
    }

    #[test]
    fn test_interaction_kind_parse() {
        assert_eq!(InteractionKind::parse("chat_opened"), InteractionKind::ChatOpened);
        assert_eq!(InteractionKind::parse("message_sent"), InteractionKind::MessageSent);
        assert_eq!(InteractionKind::parse("scrolled"), InteractionKind::Other);
    }
}
