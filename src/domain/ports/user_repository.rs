use crate::domain::entities::{GroupCount, User, UserFilter};
use crate::infrastructure::http::middleware::error::ApiResult;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &User) -> ApiResult<()>;
    async fn get_user_by_id(&self, id: &str) -> ApiResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> ApiResult<Option<User>>;
    /// Lookup used by the authentication middleware
    async fn get_user_by_api_key(&self, api_key: &str) -> ApiResult<Option<User>>;
    /// Persist profile, role, status and subscription fields
    async fn update_user(&self, user: &User) -> ApiResult<()>;
    async fn set_api_credentials(
        &self,
        user_id: &str,
        api_key: &str,
        api_secret_hash: &str,
        updated_at: &str,
    ) -> ApiResult<()>;
    /// Returns false when no such user existed
    async fn delete_user(&self, id: &str) -> ApiResult<bool>;
    async fn list_users(&self, filter: &UserFilter) -> ApiResult<(Vec<User>, i64)>;
    /// (total, subscription-active) restricted to `ids` when given
    async fn count_users(&self, ids: Option<&[String]>) -> ApiResult<(i64, i64)>;
    async fn subscription_distribution(&self) -> ApiResult<Vec<GroupCount>>;
}
