use crate::domain::entities::{AccountStatus, GroupCount, Subscription, User, UserFilter};
use crate::domain::ports::user_repository::UserRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::infrastructure::persistence::{nullable, parse_column, Database};
use async_trait::async_trait;
use sqlx::{any::AnyRow, Any, QueryBuilder, Row};

const USER_COLUMNS: &str = "id, name, email, role, status, subscription_plan, subscription_status,
     api_key, api_secret_hash, created_at, updated_at";

fn user_from_row(row: &AnyRow) -> ApiResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: parse_column(&row.try_get::<String, _>("role")?)?,
        status: parse_column(&row.try_get::<String, _>("status")?)?,
        subscription: Subscription {
            plan: parse_column(&row.try_get::<String, _>("subscription_plan")?)?,
            status: parse_column(&row.try_get::<String, _>("subscription_status")?)?,
        },
        api_key: nullable(row, "api_key")?,
        api_secret_hash: nullable(row, "api_secret_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Appends the WHERE clause shared by the listing and its count.
fn push_user_filter(builder: &mut QueryBuilder<'_, Any>, filter: &UserFilter) {
    builder.push(" WHERE 1 = 1");

    if let Some(ids) = &filter.ids {
        builder.push(" AND id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");
    }

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        builder
            .push(" AND (LOWER(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(email) LIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(status) = filter.subscription_status {
        builder
            .push(" AND subscription_status = ")
            .push_bind(status.as_str().to_string());
    }

    if let Some(role) = filter.role {
        builder.push(" AND role = ").push_bind(role.as_str().to_string());
    }
}

#[async_trait]
impl UserRepository for Database {
    async fn create_user(&self, user: &User) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO users (id, name, email, role, status, subscription_plan,
                                subscription_status, api_key, api_secret_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(user.subscription.plan.as_str())
        .bind(user.subscription.status.as_str())
        .bind(&user.api_key)
        .bind(&user.api_secret_hash)
        .bind(&user.created_at)
        .bind(&user.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::info!("User created: id={}, role={}", user.id, user.role.as_str());
        Ok(())
    }

    async fn get_user_by_id(&self, id: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_user_by_api_key(&self, api_key: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE api_key = ?", USER_COLUMNS))
            .bind(api_key)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_user(&self, user: &User) -> ApiResult<()> {
        sqlx::query(
            "UPDATE users
             SET name = ?, email = ?, role = ?, status = ?, subscription_plan = ?,
                 subscription_status = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(user.subscription.plan.as_str())
        .bind(user.subscription.status.as_str())
        .bind(&user.updated_at)
        .bind(&user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_api_credentials(
        &self,
        user_id: &str,
        api_key: &str,
        api_secret_hash: &str,
        updated_at: &str,
    ) -> ApiResult<()> {
        sqlx::query(
            "UPDATE users SET api_key = ?, api_secret_hash = ?, updated_at = ? WHERE id = ?",
        )
        .bind(api_key)
        .bind(api_secret_hash)
        .bind(updated_at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        tracing::info!("API credentials rotated for user {}", user_id);
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> ApiResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self, filter: &UserFilter) -> ApiResult<(Vec<User>, i64)> {
        if matches!(&filter.ids, Some(ids) if ids.is_empty()) {
            return Ok((Vec::new(), 0));
        }

        let mut count_query = QueryBuilder::<Any>::new("SELECT COUNT(*) as count FROM users");
        push_user_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build()
            .fetch_one(&self.pool)
            .await?
            .try_get("count")?;

        let mut query = QueryBuilder::<Any>::new(format!("SELECT {} FROM users", USER_COLUMNS));
        push_user_filter(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let rows = query.build().fetch_all(&self.pool).await?;
        let users = rows.iter().map(user_from_row).collect::<ApiResult<Vec<_>>>()?;

        Ok((users, total))
    }

    async fn count_users(&self, ids: Option<&[String]>) -> ApiResult<(i64, i64)> {
        if matches!(ids, Some(ids) if ids.is_empty()) {
            return Ok((0, 0));
        }

        let mut query = QueryBuilder::<Any>::new(
            "SELECT COUNT(*) as total,
                    COALESCE(SUM(CASE WHEN subscription_status = ",
        );
        query
            .push_bind(AccountStatus::Active.as_str().to_string())
            .push(" THEN 1 ELSE 0 END), 0) as active FROM users");
        if let Some(ids) = ids {
            query.push(" WHERE id IN (");
            let mut separated = query.separated(", ");
            for id in ids {
                separated.push_bind(id.clone());
            }
            separated.push_unseparated(")");
        }

        let row = query.build().fetch_one(&self.pool).await?;
        Ok((row.try_get("total")?, row.try_get("active")?))
    }

    async fn subscription_distribution(&self) -> ApiResult<Vec<GroupCount>> {
        let rows = sqlx::query(
            "SELECT subscription_plan as group_key, COUNT(*) as count
             FROM users
             GROUP BY subscription_plan
             ORDER BY count DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(GroupCount {
                    key: nullable(row, "group_key")?,
                    count: row.try_get("count")?,
                })
            })
            .collect()
    }
}
