use std::sync::Arc;

use crate::application::services::api_key_service::{
    has_valid_format, issue_credentials, verify_api_secret,
};
use crate::domain::entities::*;
use crate::domain::ports::ticket_repository::TicketRepository;
use crate::domain::ports::user_repository::UserRepository;
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AuthenticatedUser};
use crate::shared::utils::{now_timestamp, validate_and_normalize_email, FieldErrors};

const DEFAULT_USER_PAGE_SIZE: i64 = 20;
const RECENT_TICKETS: i64 = 10;

#[derive(Clone)]
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    ticket_repo: Arc<dyn TicketRepository>,
}

/// Validates name/email updates in place, normalizing the email.
fn validate_profile(
    errors: &mut FieldErrors,
    name: Option<&str>,
    email: &mut Option<String>,
) {
    if let Some(name) = name {
        errors.len_between("name", name, 2, 100);
    }
    if let Some(raw) = email.take() {
        match validate_and_normalize_email(&raw) {
            Ok(normalized) => *email = Some(normalized),
            Err(message) => {
                errors.push("email", message);
                *email = Some(raw);
            }
        }
    }
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, ticket_repo: Arc<dyn TicketRepository>) -> Self {
        Self {
            user_repo,
            ticket_repo,
        }
    }

    /// Resolve API credentials to an active user.
    pub async fn authenticate(&self, api_key: &str, api_secret: &str) -> ApiResult<Option<User>> {
        if !has_valid_format(api_key, api_secret) {
            tracing::debug!("API key/secret format invalid");
            return Ok(None);
        }

        let user = match self.user_repo.get_user_by_api_key(api_key).await? {
            Some(user) => user,
            None => {
                tracing::debug!("API key not found: {}", &api_key[..8]);
                return Ok(None);
            }
        };

        let Some(hash) = user.api_secret_hash.as_deref() else {
            return Ok(None);
        };

        match verify_api_secret(api_secret, hash) {
            Ok(true) if user.is_active() => Ok(Some(user)),
            Ok(true) => {
                tracing::warn!("Inactive user {} attempted to authenticate", user.id);
                Ok(None)
            }
            Ok(false) => {
                tracing::warn!("API secret verification failed for key {}", &api_key[..8]);
                Ok(None)
            }
            Err(e) => {
                tracing::error!("Bcrypt verification error: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn get_user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        self.user_repo.get_user_by_email(email).await
    }

    /// Insert a user with already issued credentials (admin bootstrap).
    pub async fn create_with_credentials(
        &self,
        mut user: User,
        api_key: String,
        api_secret_hash: String,
    ) -> ApiResult<User> {
        user.api_key = Some(api_key);
        user.api_secret_hash = Some(api_secret_hash);
        self.user_repo.create_user(&user).await?;
        Ok(user)
    }

    #[tracing::instrument(skip(self, auth_user, request), fields(caller = %auth_user.id()))]
    pub async fn create_user(
        &self,
        auth_user: &AuthenticatedUser,
        request: CreateUserRequest,
    ) -> ApiResult<CreateUserResponse> {
        if !auth_user.is_admin() {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }

        let mut errors = FieldErrors::new();
        let mut email = Some(request.email);
        validate_profile(&mut errors, Some(&request.name), &mut email);
        errors.into_result()?;
        let email = email.unwrap_or_default();

        if self.user_repo.get_user_by_email(&email).await?.is_some() {
            return Err(ApiError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }

        let mut user = User::new(
            request.name.trim().to_string(),
            email,
            request.role.unwrap_or(UserRole::User),
        );
        if let Some(subscription) = request.subscription {
            if let Some(plan) = subscription.plan {
                user.subscription.plan = plan;
            }
            if let Some(status) = subscription.status {
                user.subscription.status = status;
            }
        }

        let (credentials, hash) = issue_credentials()?;
        let user = self
            .create_with_credentials(user, credentials.api_key.clone(), hash)
            .await?;

        Ok(CreateUserResponse { user, credentials })
    }

    pub async fn list_users(
        &self,
        auth_user: &AuthenticatedUser,
        query: UserListQuery,
    ) -> ApiResult<UserListResponse> {
        let (page, limit, offset) = page_window(query.page, query.limit, DEFAULT_USER_PAGE_SIZE);

        // Non-admins only see customers of their own agents
        let (ids, owner_scope) = if auth_user.is_admin() {
            (None, None)
        } else {
            (
                Some(self.ticket_repo.ticket_user_ids(auth_user.id()).await?),
                Some(auth_user.id()),
            )
        };

        let filter = UserFilter {
            ids,
            search: query.search,
            subscription_status: query.status,
            role: query.role,
            limit,
            offset,
        };
        let (users, total) = self.user_repo.list_users(&filter).await?;

        let mut with_stats = Vec::with_capacity(users.len());
        for user in users {
            let stats = self
                .ticket_repo
                .user_ticket_stats(&user.id, owner_scope)
                .await?;
            with_stats.push(UserWithStats { user, stats });
        }

        Ok(UserListResponse {
            pagination: PaginationMetadata::new(with_stats.len(), total, page, limit),
            users: with_stats,
        })
    }

    pub async fn get_user_detail(
        &self,
        auth_user: &AuthenticatedUser,
        id: &str,
    ) -> ApiResult<UserDetailResponse> {
        let user = self
            .user_repo
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let owner_scope = if auth_user.is_admin() {
            None
        } else {
            Some(auth_user.id())
        };

        let tickets = self
            .ticket_repo
            .recent_user_tickets(&user.id, owner_scope, RECENT_TICKETS)
            .await?;
        let stats = self
            .ticket_repo
            .user_ticket_stats(&user.id, owner_scope)
            .await?;

        Ok(UserDetailResponse {
            user,
            tickets,
            stats,
        })
    }

    #[tracing::instrument(skip(self, auth_user, request), fields(caller = %auth_user.id()))]
    pub async fn update_user(
        &self,
        auth_user: &AuthenticatedUser,
        id: &str,
        request: UpdateUserRequest,
    ) -> ApiResult<User> {
        let mut request = if auth_user.is_admin() {
            request
        } else if auth_user.id() == id {
            request.self_service()
        } else {
            return Err(ApiError::Forbidden(
                "You can only update your own profile".to_string(),
            ));
        };

        if request.is_empty() {
            return Err(ApiError::BadRequest("No valid fields to update".to_string()));
        }

        let mut errors = FieldErrors::new();
        validate_profile(&mut errors, request.name.as_deref(), &mut request.email);
        errors.into_result()?;

        let mut user = self
            .user_repo
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if let Some(email) = request.email {
            if email != user.email {
                if self.user_repo.get_user_by_email(&email).await?.is_some() {
                    return Err(ApiError::Conflict(
                        "A user with this email already exists".to_string(),
                    ));
                }
                user.email = email;
            }
        }
        if let Some(name) = request.name {
            user.name = name.trim().to_string();
        }
        if let Some(role) = request.role {
            user.role = role;
        }
        if let Some(status) = request.status {
            user.status = status;
        }
        if let Some(subscription) = request.subscription {
            if let Some(plan) = subscription.plan {
                user.subscription.plan = plan;
            }
            if let Some(status) = subscription.status {
                user.subscription.status = status;
            }
        }
        user.updated_at = now_timestamp();

        self.user_repo.update_user(&user).await?;
        Ok(user)
    }

    pub async fn delete_user(&self, auth_user: &AuthenticatedUser, id: &str) -> ApiResult<()> {
        if !auth_user.is_admin() {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        if auth_user.id() == id {
            return Err(ApiError::BadRequest(
                "You cannot delete your own account".to_string(),
            ));
        }

        if !self.user_repo.delete_user(id).await? {
            return Err(ApiError::NotFound("User not found".to_string()));
        }

        tracing::info!("User {} deleted by {}", id, auth_user.id());
        Ok(())
    }

    pub async fn rotate_credentials(
        &self,
        auth_user: &AuthenticatedUser,
        id: &str,
    ) -> ApiResult<ApiCredentials> {
        if !auth_user.is_admin() && auth_user.id() != id {
            return Err(ApiError::Forbidden(
                "You can only rotate your own credentials".to_string(),
            ));
        }

        if self.user_repo.get_user_by_id(id).await?.is_none() {
            return Err(ApiError::NotFound("User not found".to_string()));
        }

        let (credentials, hash) = issue_credentials()?;
        self.user_repo
            .set_api_credentials(id, &credentials.api_key, &hash, &now_timestamp())
            .await?;

        Ok(credentials)
    }

    pub async fn analytics(&self, auth_user: &AuthenticatedUser) -> ApiResult<UserAnalyticsResponse> {
        let (counts, engagement, subscriptions) = if auth_user.is_admin() {
            (
                self.user_repo.count_users(None).await?,
                self.ticket_repo.engagement_stats(None).await?,
                Some(self.user_repo.subscription_distribution().await?),
            )
        } else {
            let ids = self.ticket_repo.ticket_user_ids(auth_user.id()).await?;
            (
                self.user_repo.count_users(Some(&ids)).await?,
                self.ticket_repo.engagement_stats(Some(auth_user.id())).await?,
                None,
            )
        };

        Ok(UserAnalyticsResponse {
            overview: UserAnalyticsOverview {
                total_users: counts.0,
                active_users: counts.1,
                engagement,
            },
            subscriptions,
        })
    }
}
