use crate::domain::entities::{
    Agent, AgentAnalytics, InteractionKind, LyzrConfig, OptimizationSettings, TrainingEntry,
    WidgetSettings,
};
use crate::domain::ports::agent_repository::AgentRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::infrastructure::persistence::{
    decode_string_list, encode_string_list, nullable, parse_column, Database,
};
use async_trait::async_trait;
use sqlx::{any::AnyRow, Any, QueryBuilder, Row};

const AGENT_COLUMNS: &str = "id, owner_id, name, description, lyzr_agent_id, lyzr_api_endpoint,
     lyzr_api_key, widget_theme, widget_primary_color, widget_position, widget_welcome_message,
     widget_placeholder, widget_title, domains, is_active, total_chats, total_messages,
     page_views, last_used, last_seen, optimization, last_training_update, created_at, updated_at";

fn agent_from_row(row: &AnyRow) -> ApiResult<Agent> {
    let optimization = match nullable::<String>(row, "optimization")? {
        Some(raw) => Some(serde_json::from_str::<OptimizationSettings>(&raw)?),
        None => None,
    };

    Ok(Agent {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        description: nullable(row, "description")?,
        lyzr_config: LyzrConfig {
            agent_id: row.try_get("lyzr_agent_id")?,
            api_endpoint: row.try_get("lyzr_api_endpoint")?,
            api_key: row.try_get("lyzr_api_key")?,
        },
        widget: WidgetSettings {
            theme: parse_column(&row.try_get::<String, _>("widget_theme")?)?,
            primary_color: row.try_get("widget_primary_color")?,
            position: parse_column(&row.try_get::<String, _>("widget_position")?)?,
            welcome_message: row.try_get("widget_welcome_message")?,
            placeholder: row.try_get("widget_placeholder")?,
            title: row.try_get("widget_title")?,
        },
        domains: decode_string_list(&row.try_get::<String, _>("domains")?)?,
        is_active: row.try_get::<i64, _>("is_active")? != 0,
        analytics: AgentAnalytics {
            total_chats: row.try_get("total_chats")?,
            total_messages: row.try_get("total_messages")?,
            page_views: row.try_get("page_views")?,
            last_used: nullable(row, "last_used")?,
            last_seen: nullable(row, "last_seen")?,
        },
        optimization,
        last_training_update: nullable(row, "last_training_update")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn training_entry_from_row(row: &AnyRow) -> ApiResult<TrainingEntry> {
    Ok(TrainingEntry {
        id: row.try_get("id")?,
        question: row.try_get("question")?,
        answer: row.try_get("answer")?,
        category: nullable(row, "category")?,
        tags: decode_string_list(&row.try_get::<String, _>("tags")?)?,
        uploaded_by: row.try_get("uploaded_by")?,
        uploaded_at: row.try_get("uploaded_at")?,
    })
}

fn push_training_filter(
    builder: &mut QueryBuilder<'_, Any>,
    agent_id: &str,
    category: Option<&str>,
    search: Option<&str>,
) {
    builder
        .push(" WHERE agent_id = ")
        .push_bind(agent_id.to_string());

    if let Some(category) = category {
        builder.push(" AND category = ").push_bind(category.to_string());
    }

    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        builder
            .push(" AND (LOWER(question) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(answer) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl AgentRepository for Database {
    async fn create_agent(&self, agent: &Agent) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO agents (id, owner_id, name, description, lyzr_agent_id, lyzr_api_endpoint,
                                 lyzr_api_key, widget_theme, widget_primary_color, widget_position,
                                 widget_welcome_message, widget_placeholder, widget_title, domains,
                                 is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&agent.id)
        .bind(&agent.owner_id)
        .bind(&agent.name)
        .bind(&agent.description)
        .bind(&agent.lyzr_config.agent_id)
        .bind(&agent.lyzr_config.api_endpoint)
        .bind(&agent.lyzr_config.api_key)
        .bind(agent.widget.theme.as_str())
        .bind(&agent.widget.primary_color)
        .bind(agent.widget.position.as_str())
        .bind(&agent.widget.welcome_message)
        .bind(&agent.widget.placeholder)
        .bind(&agent.widget.title)
        .bind(encode_string_list(&agent.domains)?)
        .bind(if agent.is_active { 1_i64 } else { 0_i64 })
        .bind(&agent.created_at)
        .bind(&agent.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::info!("Agent created: id={}, owner={}", agent.id, agent.owner_id);
        Ok(())
    }

    async fn get_agent_by_id(&self, id: &str) -> ApiResult<Option<Agent>> {
        let row = sqlx::query(&format!("SELECT {} FROM agents WHERE id = ?", AGENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(agent_from_row).transpose()
    }

    async fn get_owned_agent(&self, id: &str, owner_id: &str) -> ApiResult<Option<Agent>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM agents WHERE id = ? AND owner_id = ?",
            AGENT_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(agent_from_row).transpose()
    }

    async fn list_agents_by_owner(&self, owner_id: &str) -> ApiResult<Vec<Agent>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM agents WHERE owner_id = ? ORDER BY created_at DESC",
            AGENT_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(agent_from_row).collect()
    }

    async fn lyzr_agent_id_exists(
        &self,
        lyzr_agent_id: &str,
        exclude_agent_id: Option<&str>,
    ) -> ApiResult<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM agents WHERE lyzr_agent_id = ? AND id != ?",
        )
        .bind(lyzr_agent_id)
        .bind(exclude_agent_id.unwrap_or(""))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get::<i64, _>("count")? > 0)
    }

    async fn update_agent(&self, agent: &Agent) -> ApiResult<()> {
        sqlx::query(
            "UPDATE agents
             SET name = ?, description = ?, lyzr_agent_id = ?, lyzr_api_endpoint = ?,
                 lyzr_api_key = ?, widget_theme = ?, widget_primary_color = ?,
                 widget_position = ?, widget_welcome_message = ?, widget_placeholder = ?,
                 widget_title = ?, domains = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&agent.name)
        .bind(&agent.description)
        .bind(&agent.lyzr_config.agent_id)
        .bind(&agent.lyzr_config.api_endpoint)
        .bind(&agent.lyzr_config.api_key)
        .bind(agent.widget.theme.as_str())
        .bind(&agent.widget.primary_color)
        .bind(agent.widget.position.as_str())
        .bind(&agent.widget.welcome_message)
        .bind(&agent.widget.placeholder)
        .bind(&agent.widget.title)
        .bind(encode_string_list(&agent.domains)?)
        .bind(&agent.updated_at)
        .bind(&agent.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_agent(&self, id: &str, owner_id: &str) -> ApiResult<bool> {
        let result = sqlx::query("DELETE FROM agents WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn toggle_agent_active(
        &self,
        id: &str,
        owner_id: &str,
        updated_at: &str,
    ) -> ApiResult<bool> {
        let result = sqlx::query(
            "UPDATE agents SET is_active = 1 - is_active, updated_at = ?
             WHERE id = ? AND owner_id = ?",
        )
        .bind(updated_at)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_chat_activity(&self, id: &str, new_chat: bool, at: &str) -> ApiResult<()> {
        sqlx::query(
            "UPDATE agents
             SET total_messages = total_messages + 1,
                 total_chats = total_chats + ?,
                 last_used = ?
             WHERE id = ?",
        )
        .bind(if new_chat { 1_i64 } else { 0_i64 })
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_script_load(&self, id: &str) -> ApiResult<()> {
        sqlx::query("UPDATE agents SET page_views = page_views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn record_page_view(&self, id: &str, at: &str) -> ApiResult<()> {
        sqlx::query("UPDATE agents SET page_views = page_views + 1, last_seen = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn record_widget_interaction(
        &self,
        id: &str,
        kind: InteractionKind,
        at: &str,
    ) -> ApiResult<()> {
        let sql = match kind {
            InteractionKind::ChatOpened => {
                "UPDATE agents SET total_chats = total_chats + 1, last_used = ? WHERE id = ?"
            }
            InteractionKind::MessageSent => {
                "UPDATE agents SET total_messages = total_messages + 1, last_used = ? WHERE id = ?"
            }
            InteractionKind::Other => "UPDATE agents SET last_used = ? WHERE id = ?",
        };

        sqlx::query(sql).bind(at).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn update_optimization(
        &self,
        id: &str,
        settings: &OptimizationSettings,
        updated_at: &str,
    ) -> ApiResult<()> {
        sqlx::query("UPDATE agents SET optimization = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(settings)?)
            .bind(updated_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn add_training_entries(
        &self,
        agent_id: &str,
        entries: &[TrainingEntry],
        at: &str,
    ) -> ApiResult<i64> {
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            sqlx::query(
                "INSERT INTO agent_training_data (id, agent_id, question, answer, category, tags,
                                                  uploaded_by, uploaded_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&entry.id)
            .bind(agent_id)
            .bind(&entry.question)
            .bind(&entry.answer)
            .bind(&entry.category)
            .bind(encode_string_list(&entry.tags)?)
            .bind(&entry.uploaded_by)
            .bind(&entry.uploaded_at)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE agents SET last_training_update = ?, updated_at = ? WHERE id = ?")
            .bind(at)
            .bind(at)
            .bind(agent_id)
            .execute(&mut *tx)
            .await?;

        let total: i64 =
            sqlx::query("SELECT COUNT(*) as count FROM agent_training_data WHERE agent_id = ?")
                .bind(agent_id)
                .fetch_one(&mut *tx)
                .await?
                .try_get("count")?;

        tx.commit().await?;

        tracing::info!(
            "Stored {} training entries for agent {} ({} total)",
            entries.len(),
            agent_id,
            total
        );
        Ok(total)
    }

    async fn list_training_entries(
        &self,
        agent_id: &str,
        category: Option<&str>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> ApiResult<(Vec<TrainingEntry>, i64)> {
        let mut count_query =
            QueryBuilder::<Any>::new("SELECT COUNT(*) as count FROM agent_training_data");
        push_training_filter(&mut count_query, agent_id, category, search);
        let total: i64 = count_query
            .build()
            .fetch_one(&self.pool)
            .await?
            .try_get("count")?;

        let mut query = QueryBuilder::<Any>::new(
            "SELECT id, question, answer, category, tags, uploaded_by, uploaded_at
             FROM agent_training_data",
        );
        push_training_filter(&mut query, agent_id, category, search);
        query
            .push(" ORDER BY seq LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = query.build().fetch_all(&self.pool).await?;
        let entries = rows
            .iter()
            .map(training_entry_from_row)
            .collect::<ApiResult<Vec<_>>>()?;

        Ok((entries, total))
    }

    async fn training_categories(&self, agent_id: &str) -> ApiResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT category FROM agent_training_data
             WHERE agent_id = ? AND category IS NOT NULL
             ORDER BY category",
        )
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok(row.try_get::<String, _>("category")?))
            .collect()
    }

    async fn count_training_entries(&self, agent_id: &str) -> ApiResult<i64> {
        let row =
            sqlx::query("SELECT COUNT(*) as count FROM agent_training_data WHERE agent_id = ?")
                .bind(agent_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.try_get("count")?)
    }
}
