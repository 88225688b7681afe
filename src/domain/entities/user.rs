use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{GroupCount, PaginationMetadata, Ticket};
use crate::shared::utils::now_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "user" => Ok(UserRole::User),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}

/// Shared by the account status and the subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Free,
    Pro,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Pro => "pro",
            SubscriptionPlan::Enterprise => "enterprise",
        }
    }
}

impl std::str::FromStr for SubscriptionPlan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SubscriptionPlan::Free),
            "pro" => Ok(SubscriptionPlan::Pro),
            "enterprise" => Ok(SubscriptionPlan::Enterprise),
            _ => Err(format!("Invalid subscription plan: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan: SubscriptionPlan,
    pub status: AccountStatus,
}

impl Default for Subscription {
    fn default() -> Self {
        Self {
            plan: SubscriptionPlan::Free,
            status: AccountStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub status: AccountStatus,
    pub subscription: Subscription,
    pub api_key: Option<String>,
    #[serde(skip_serializing)]
    pub api_secret_hash: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn new(name: String, email: String, role: UserRole) -> Self {
        let now = now_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            role,
            status: AccountStatus::Active,
            subscription: Subscription::default(),
            api_key: None,
            api_secret_hash: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

// DTOs for API requests/responses

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionUpdate {
    pub plan: Option<SubscriptionPlan>,
    pub status: Option<AccountStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub role: Option<UserRole>,
    pub subscription: Option<SubscriptionUpdate>,
}

/// Returned once on creation or rotation; the secret is never stored in
/// plain text.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub user: User,
    pub credentials: ApiCredentials,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<AccountStatus>,
    pub subscription: Option<SubscriptionUpdate>,
}

impl UpdateUserRequest {
    /// Keep only the fields a user may change on their own profile.
    pub fn self_service(self) -> Self {
        Self {
            name: self.name,
            email: self.email,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.status.is_none()
            && self.subscription.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub status: Option<AccountStatus>,
    pub role: Option<UserRole>,
}

/// Storage-level filter for user listings.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Restrict to these ids; `Some(vec![])` matches nothing.
    pub ids: Option<Vec<String>>,
    pub search: Option<String>,
    pub subscription_status: Option<AccountStatus>,
    pub role: Option<UserRole>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTicketStats {
    pub total_tickets: i64,
    pub open_tickets: i64,
    pub in_progress_tickets: i64,
    pub resolved_tickets: i64,
    pub closed_tickets: i64,
    pub avg_satisfaction: f64,
    pub total_interactions: i64,
    pub last_activity: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserWithStats {
    #[serde(flatten)]
    pub user: User,
    pub stats: UserTicketStats,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserWithStats>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    pub user: User,
    pub tickets: Vec<Ticket>,
    pub stats: UserTicketStats,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementStats {
    pub engaged_users: i64,
    pub avg_tickets_per_user: f64,
    pub avg_satisfaction: f64,
    pub avg_interactions_per_user: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalyticsOverview {
    pub total_users: i64,
    pub active_users: i64,
    #[serde(flatten)]
    pub engagement: EngagementStats,
}

#[derive(Debug, Serialize)]
pub struct UserAnalyticsResponse {
    pub overview: UserAnalyticsOverview,
    /// Plan distribution, only computed for admins.
    pub subscriptions: Option<Vec<GroupCount>>,
}
