use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{GroupCount, PaginationMetadata};
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::shared::utils::{now_timestamp, validate_and_normalize_email, FieldErrors};

pub const CHAT_TICKET_CATEGORY: &str = "General Support";
const CHAT_TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    /// Resolved and closed tickets count as finished for timing purposes.
    pub fn is_finished(&self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(format!("Invalid ticket status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }
}

impl std::str::FromStr for TicketPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TicketPriority::Low),
            "medium" => Ok(TicketPriority::Medium),
            "high" => Ok(TicketPriority::High),
            "urgent" => Ok(TicketPriority::Urgent),
            _ => Err(format!("Invalid ticket priority: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    User,
    #[default]
    Agent,
    System,
}

impl MessageSender {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSender::User => "user",
            MessageSender::Agent => "agent",
            MessageSender::System => "system",
        }
    }
}

impl std::str::FromStr for MessageSender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageSender::User),
            "agent" => Ok(MessageSender::Agent),
            "system" => Ok(MessageSender::System),
            _ => Err(format!("Invalid message sender: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketMessage {
    pub id: String,
    pub content: String,
    pub sender: MessageSender,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TicketMessage {
    pub fn new(content: String, sender: MessageSender, metadata: Option<serde_json::Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            sender,
            timestamp: now_timestamp(),
            metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub summary: Option<String>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl CustomerInfo {
    /// Check lengths and normalize the email in place.
    pub fn validate(&mut self, errors: &mut FieldErrors) {
        if let Some(name) = &self.name {
            errors.max_len("customerInfo.name", name, 100);
        }
        if let Some(phone) = &self.phone {
            errors.max_len("customerInfo.phone", phone, 20);
        }
        if let Some(email) = self.email.take() {
            if email.trim().is_empty() {
                return;
            }
            match validate_and_normalize_email(&email) {
                Ok(normalized) => self.email = Some(normalized),
                Err(_) => {
                    errors.push("customerInfo.email", "Please provide a valid email");
                    self.email = Some(email);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketAnalytics {
    /// Minutes until the first agent reply
    pub response_time: Option<f64>,
    /// Minutes until resolved or closed
    pub resolution_time: Option<f64>,
    pub satisfaction: Option<i64>,
    pub interactions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: Option<String>,
    #[serde(rename = "agent")]
    pub agent_id: String,
    #[serde(rename = "user")]
    pub user_id: Option<String>,
    pub assigned_to: Option<String>,
    pub session_id: Option<String>,
    pub messages: Vec<TicketMessage>,
    pub resolution: Option<Resolution>,
    pub tags: Vec<String>,
    pub customer_info: CustomerInfo,
    pub analytics: TicketAnalytics,
    pub created_at: String,
    pub updated_at: String,
    /// Whole days since creation, filled in when the ticket is loaded
    #[serde(default)]
    pub age_days: i64,
}

impl Ticket {
    pub fn new(agent_id: String, title: String, description: String) -> Self {
        let now = now_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            status: TicketStatus::Open,
            priority: TicketPriority::Medium,
            category: None,
            agent_id,
            user_id: None,
            assigned_to: None,
            session_id: None,
            messages: Vec::new(),
            resolution: None,
            tags: Vec::new(),
            customer_info: CustomerInfo::default(),
            analytics: TicketAnalytics::default(),
            created_at: now.clone(),
            updated_at: now,
            age_days: 0,
        }
    }

    /// The ticket opened by the first chat message of a session.
    pub fn for_chat_session(
        agent_id: String,
        session_id: String,
        message: &str,
        customer_info: CustomerInfo,
    ) -> Self {
        let mut ticket = Self::new(agent_id, chat_ticket_title(message), message.to_string());
        ticket.session_id = Some(session_id);
        ticket.category = Some(CHAT_TICKET_CATEGORY.to_string());
        ticket.customer_info = customer_info;
        ticket
    }

    pub fn last_message(&self) -> Option<&TicketMessage> {
        self.messages.last()
    }
}

/// First 50 characters of the opening message, with an ellipsis when cut.
pub fn chat_ticket_title(message: &str) -> String {
    if message.chars().count() > CHAT_TITLE_MAX_CHARS {
        let head: String = message.chars().take(CHAT_TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        message.to_string()
    }
}

// DTOs for API requests/responses

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: String,
    pub priority: Option<TicketPriority>,
    pub category: Option<String>,
    pub agent_id: String,
    pub session_id: Option<String>,
    pub customer_info: Option<CustomerInfo>,
    pub tags: Option<Vec<String>>,
}

impl CreateTicketRequest {
    pub fn validate(&mut self) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        errors.required("title", &self.title, "Title is required");
        errors.max_len("title", &self.title, 200);
        errors.required("description", &self.description, "Description is required");
        errors.max_len("description", &self.description, 2000);
        errors.required("agentId", &self.agent_id, "Agent ID is required");
        if let Some(category) = &self.category {
            errors.max_len("category", category, 100);
        }
        if let Some(tags) = &self.tags {
            errors.each_max_len("tags", tags, 50);
        }
        if let Some(info) = self.customer_info.as_mut() {
            info.validate(&mut errors);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionInput {
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub category: Option<String>,
    pub assigned_to: Option<String>,
    pub tags: Option<Vec<String>>,
    pub resolution: Option<ResolutionInput>,
    pub satisfaction: Option<i64>,
}

impl UpdateTicketRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(title) = &self.title {
            errors.required("title", title, "Title cannot be empty");
            errors.max_len("title", title, 200);
        }
        if let Some(description) = &self.description {
            errors.max_len("description", description, 2000);
        }
        if let Some(category) = &self.category {
            errors.max_len("category", category, 100);
        }
        if let Some(tags) = &self.tags {
            errors.each_max_len("tags", tags, 50);
        }
        if let Some(summary) = self.resolution.as_ref().and_then(|r| r.summary.as_ref()) {
            errors.max_len("resolution.summary", summary, 1000);
        }
        if let Some(satisfaction) = self.satisfaction {
            if !(1..=5).contains(&satisfaction) {
                errors.push("satisfaction", "Must be between 1 and 5");
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddMessageRequest {
    pub content: String,
    pub sender: Option<MessageSender>,
    pub metadata: Option<serde_json::Value>,
}

impl AddMessageRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        errors.required("content", &self.content, "Message content is required");
        errors.max_len("content", &self.content, 2000);
        errors.into_result()
    }
}

#[derive(Debug, Serialize)]
pub struct AddMessageResponse {
    pub ticket: Ticket,
    pub message: TicketMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub category: Option<String>,
}

/// Storage-level filter; every listing is scoped to one agent owner.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub owner_id: String,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub category: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct TicketListResponse {
    pub tickets: Vec<Ticket>,
    #[serde(flatten)]
    pub pagination: PaginationMetadata,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketOverview {
    pub total: i64,
    pub open: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub closed: i64,
    pub avg_response_time: f64,
    pub avg_resolution_time: f64,
    pub avg_satisfaction: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketAnalyticsResponse {
    pub overview: TicketOverview,
    pub by_priority: Vec<GroupCount>,
    pub by_category: Vec<GroupCount>,
}
