use crate::domain::entities::{
    CustomerInfo, DailySatisfaction, EngagementStats, GroupCount, PerformanceMetrics,
    RecentFeedback, Resolution, Ticket, TicketAnalytics, TicketFilter, TicketMessage,
    TicketOverview, UserTicketStats,
};
use crate::domain::ports::ticket_repository::TicketRepository;
use crate::domain::services::resolution_rate;
use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};
use crate::infrastructure::persistence::{
    decode_json, decode_string_list, encode_json, encode_string_list, nullable, parse_column,
    Database,
};
use crate::shared::utils::days_since;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    any::{AnyArguments, AnyRow},
    query::Query,
    Any, QueryBuilder, Row,
};
use std::collections::HashMap;

const TICKET_COLUMNS: &str = "id, title, description, status, priority, category, agent_id,
     user_id, assigned_to, session_id, resolution_summary, resolved_by, resolved_at, tags,
     customer_name, customer_email, customer_phone, customer_metadata, response_time,
     resolution_time, satisfaction, interactions, created_at, updated_at";

const INSERT_TICKET: &str = "INSERT INTO tickets (id, title, description, status, priority,
     category, agent_id, user_id, assigned_to, session_id, resolution_summary, resolved_by,
     resolved_at, tags, customer_name, customer_email, customer_phone, customer_metadata,
     response_time, resolution_time, satisfaction, interactions, created_at, updated_at)
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Restricts a ticket query to agents of one owner.
const OWNER_SCOPE: &str = "agent_id IN (SELECT id FROM agents WHERE owner_id = ?)";

fn ticket_from_row(row: &AnyRow) -> ApiResult<Ticket> {
    let summary: Option<String> = nullable(row, "resolution_summary")?;
    let resolved_by: Option<String> = nullable(row, "resolved_by")?;
    let resolved_at: Option<String> = nullable(row, "resolved_at")?;
    let resolution = if summary.is_some() || resolved_by.is_some() || resolved_at.is_some() {
        Some(Resolution {
            summary,
            resolved_by,
            resolved_at,
        })
    } else {
        None
    };

    let created_at: String = row.try_get("created_at")?;

    Ok(Ticket {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: parse_column(&row.try_get::<String, _>("status")?)?,
        priority: parse_column(&row.try_get::<String, _>("priority")?)?,
        category: nullable(row, "category")?,
        agent_id: row.try_get("agent_id")?,
        user_id: nullable(row, "user_id")?,
        assigned_to: nullable(row, "assigned_to")?,
        session_id: nullable(row, "session_id")?,
        messages: Vec::new(),
        resolution,
        tags: decode_string_list(&row.try_get::<String, _>("tags")?)?,
        customer_info: CustomerInfo {
            name: nullable(row, "customer_name")?,
            email: nullable(row, "customer_email")?,
            phone: nullable(row, "customer_phone")?,
            metadata: decode_json(nullable(row, "customer_metadata")?)?,
        },
        analytics: TicketAnalytics {
            response_time: nullable(row, "response_time")?,
            resolution_time: nullable(row, "resolution_time")?,
            satisfaction: nullable(row, "satisfaction")?,
            interactions: row.try_get("interactions")?,
        },
        age_days: days_since(&created_at, Utc::now()),
        created_at,
        updated_at: row.try_get("updated_at")?,
    })
}

fn message_from_row(row: &AnyRow) -> ApiResult<TicketMessage> {
    Ok(TicketMessage {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        sender: parse_column(&row.try_get::<String, _>("sender")?)?,
        timestamp: row.try_get("created_at")?,
        metadata: decode_json(nullable(row, "metadata")?)?,
    })
}

fn group_counts(rows: &[AnyRow]) -> ApiResult<Vec<GroupCount>> {
    rows.iter()
        .map(|row| {
            Ok(GroupCount {
                key: nullable(row, "group_key")?,
                count: row.try_get("count")?,
            })
        })
        .collect()
}

fn bind_ticket<'q>(
    sql: &'q str,
    ticket: &'q Ticket,
    tags: String,
    customer_metadata: Option<String>,
) -> Query<'q, Any, AnyArguments<'q>> {
    let resolution = ticket.resolution.as_ref();
    sqlx::query(sql)
        .bind(&ticket.id)
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.priority.as_str())
        .bind(&ticket.category)
        .bind(&ticket.agent_id)
        .bind(&ticket.user_id)
        .bind(&ticket.assigned_to)
        .bind(&ticket.session_id)
        .bind(resolution.and_then(|r| r.summary.clone()))
        .bind(resolution.and_then(|r| r.resolved_by.clone()))
        .bind(resolution.and_then(|r| r.resolved_at.clone()))
        .bind(tags)
        .bind(&ticket.customer_info.name)
        .bind(&ticket.customer_info.email)
        .bind(&ticket.customer_info.phone)
        .bind(customer_metadata)
        .bind(ticket.analytics.response_time)
        .bind(ticket.analytics.resolution_time)
        .bind(ticket.analytics.satisfaction)
        .bind(ticket.analytics.interactions)
        .bind(&ticket.created_at)
        .bind(&ticket.updated_at)
}

impl Database {
    /// Insert messages after the latest one already stored for the ticket,
    /// never stamping a message earlier than its predecessor.
    async fn append_messages_internal(
        &self,
        conn: &mut sqlx::AnyConnection,
        ticket_id: &str,
        messages: &[TicketMessage],
    ) -> ApiResult<Vec<TicketMessage>> {
        let row = sqlx::query(
            "SELECT MAX(created_at) as last_at FROM ticket_messages WHERE ticket_id = ?",
        )
        .bind(ticket_id)
        .fetch_one(&mut *conn)
        .await?;
        let mut last: Option<String> = nullable(&row, "last_at")?;

        let mut stored = Vec::with_capacity(messages.len());
        for message in messages {
            let mut message = message.clone();
            if let Some(previous) = &last {
                if message.timestamp < *previous {
                    message.timestamp = previous.clone();
                }
            }

            sqlx::query(
                "INSERT INTO ticket_messages (id, ticket_id, content, sender, metadata, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&message.id)
            .bind(ticket_id)
            .bind(&message.content)
            .bind(message.sender.as_str())
            .bind(encode_json(message.metadata.as_ref())?)
            .bind(&message.timestamp)
            .execute(&mut *conn)
            .await?;

            last = Some(message.timestamp.clone());
            stored.push(message);
        }

        Ok(stored)
    }

    async fn load_messages(&self, ticket_id: &str) -> ApiResult<Vec<TicketMessage>> {
        let rows = sqlx::query(
            "SELECT id, content, sender, metadata, created_at
             FROM ticket_messages
             WHERE ticket_id = ?
             ORDER BY seq",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(message_from_row).collect()
    }

    /// Fill in the message logs of several tickets with one query.
    async fn attach_messages(&self, tickets: &mut [Ticket]) -> ApiResult<()> {
        if tickets.is_empty() {
            return Ok(());
        }

        let mut query = QueryBuilder::<Any>::new(
            "SELECT ticket_id, id, content, sender, metadata, created_at
             FROM ticket_messages WHERE ticket_id IN (",
        );
        let mut separated = query.separated(", ");
        for ticket in tickets.iter() {
            separated.push_bind(ticket.id.clone());
        }
        separated.push_unseparated(") ORDER BY seq");

        let rows = query.build().fetch_all(&self.pool).await?;
        let mut by_ticket: HashMap<String, Vec<TicketMessage>> = HashMap::new();
        for row in &rows {
            let ticket_id: String = row.try_get("ticket_id")?;
            by_ticket
                .entry(ticket_id)
                .or_default()
                .push(message_from_row(row)?);
        }

        for ticket in tickets.iter_mut() {
            ticket.messages = by_ticket.remove(&ticket.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn fetch_ticket(&self, row: Option<AnyRow>) -> ApiResult<Option<Ticket>> {
        match row {
            Some(row) => {
                let mut ticket = ticket_from_row(&row)?;
                ticket.messages = self.load_messages(&ticket.id).await?;
                Ok(Some(ticket))
            }
            None => Ok(None),
        }
    }
}

fn push_ticket_filter(builder: &mut QueryBuilder<'_, Any>, filter: &TicketFilter) {
    builder
        .push(" WHERE agent_id IN (SELECT id FROM agents WHERE owner_id = ")
        .push_bind(filter.owner_id.clone())
        .push(")");

    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str().to_string());
    }
    if let Some(priority) = filter.priority {
        builder
            .push(" AND priority = ")
            .push_bind(priority.as_str().to_string());
    }
    if let Some(category) = &filter.category {
        builder.push(" AND category = ").push_bind(category.clone());
    }
}

/// `user_id = ?` plus the optional owner scope.
fn push_user_scope(builder: &mut QueryBuilder<'_, Any>, user_id: &str, owner_id: Option<&str>) {
    builder.push(" WHERE user_id = ").push_bind(user_id.to_string());
    if let Some(owner_id) = owner_id {
        builder
            .push(" AND agent_id IN (SELECT id FROM agents WHERE owner_id = ")
            .push_bind(owner_id.to_string())
            .push(")");
    }
}

#[async_trait]
impl TicketRepository for Database {
    async fn create_ticket(&self, ticket: &Ticket) -> ApiResult<()> {
        let mut tx = self.pool.begin().await?;

        bind_ticket(
            INSERT_TICKET,
            ticket,
            encode_string_list(&ticket.tags)?,
            encode_json(ticket.customer_info.metadata.as_ref())?,
        )
        .execute(&mut *tx)
        .await?;

        if !ticket.messages.is_empty() {
            self.append_messages_internal(&mut tx, &ticket.id, &ticket.messages)
                .await?;
        }

        tx.commit().await?;

        tracing::info!("Ticket created: id={}, agent={}", ticket.id, ticket.agent_id);
        Ok(())
    }

    async fn get_ticket_by_id(&self, id: &str) -> ApiResult<Option<Ticket>> {
        let row = sqlx::query(&format!("SELECT {} FROM tickets WHERE id = ?", TICKET_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        self.fetch_ticket(row).await
    }

    async fn get_owned_ticket(&self, id: &str, owner_id: &str) -> ApiResult<Option<Ticket>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE id = ? AND {}",
            TICKET_COLUMNS, OWNER_SCOPE
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        self.fetch_ticket(row).await
    }

    async fn get_ticket_by_session(&self, session_id: &str) -> ApiResult<Option<Ticket>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE session_id = ?",
            TICKET_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        self.fetch_ticket(row).await
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> ApiResult<(Vec<Ticket>, i64)> {
        let mut count_query = QueryBuilder::<Any>::new("SELECT COUNT(*) as count FROM tickets");
        push_ticket_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build()
            .fetch_one(&self.pool)
            .await?
            .try_get("count")?;

        let mut query =
            QueryBuilder::<Any>::new(format!("SELECT {} FROM tickets", TICKET_COLUMNS));
        push_ticket_filter(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let rows = query.build().fetch_all(&self.pool).await?;
        let mut tickets = rows
            .iter()
            .map(ticket_from_row)
            .collect::<ApiResult<Vec<_>>>()?;
        self.attach_messages(&mut tickets).await?;

        Ok((tickets, total))
    }

    async fn update_ticket(&self, ticket: &Ticket) -> ApiResult<()> {
        let resolution = ticket.resolution.as_ref();
        sqlx::query(
            "UPDATE tickets
             SET title = ?, description = ?, status = ?, priority = ?, category = ?,
                 assigned_to = ?, tags = ?, resolution_summary = ?, resolved_by = ?,
                 resolved_at = ?, response_time = ?, resolution_time = ?, satisfaction = ?,
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.priority.as_str())
        .bind(&ticket.category)
        .bind(&ticket.assigned_to)
        .bind(encode_string_list(&ticket.tags)?)
        .bind(resolution.and_then(|r| r.summary.clone()))
        .bind(resolution.and_then(|r| r.resolved_by.clone()))
        .bind(resolution.and_then(|r| r.resolved_at.clone()))
        .bind(ticket.analytics.response_time)
        .bind(ticket.analytics.resolution_time)
        .bind(ticket.analytics.satisfaction)
        .bind(&ticket.updated_at)
        .bind(&ticket.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_ticket(&self, id: &str, owner_id: &str) -> ApiResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM tickets WHERE id = ? AND {}", OWNER_SCOPE))
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_message(
        &self,
        ticket_id: &str,
        message: &TicketMessage,
        response_time: Option<f64>,
    ) -> ApiResult<TicketMessage> {
        let mut tx = self.pool.begin().await?;

        // Write first so the transaction holds the write lock from the start
        sqlx::query(
            "UPDATE tickets
             SET interactions = interactions + 1,
                 response_time = COALESCE(response_time, ?),
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(response_time)
        .bind(&message.timestamp)
        .bind(ticket_id)
        .execute(&mut *tx)
        .await?;

        let mut stored = self
            .append_messages_internal(&mut tx, ticket_id, std::slice::from_ref(message))
            .await?;

        tx.commit().await?;

        stored
            .pop()
            .ok_or_else(|| ApiError::Internal("Message was not stored".to_string()))
    }

    async fn record_chat_exchange(
        &self,
        ticket: &Ticket,
        messages: &[TicketMessage],
    ) -> ApiResult<(String, bool)> {
        let session_id = ticket
            .session_id
            .as_deref()
            .ok_or_else(|| ApiError::Internal("Chat ticket without a session id".to_string()))?;

        let mut tx = self.pool.begin().await?;

        let insert_sql = format!("{} ON CONFLICT(session_id) DO NOTHING", INSERT_TICKET);
        let inserted = bind_ticket(
            &insert_sql,
            ticket,
            encode_string_list(&ticket.tags)?,
            encode_json(ticket.customer_info.metadata.as_ref())?,
        )
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        let ticket_id = if inserted {
            ticket.id.clone()
        } else {
            sqlx::query(
                "UPDATE tickets SET interactions = interactions + 1, updated_at = ?
                 WHERE session_id = ?",
            )
            .bind(&ticket.updated_at)
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query("SELECT id FROM tickets WHERE session_id = ?")
                .bind(session_id)
                .fetch_one(&mut *tx)
                .await?
                .try_get("id")?
        };

        self.append_messages_internal(&mut tx, &ticket_id, messages)
            .await?;

        tx.commit().await?;

        if inserted {
            tracing::info!("Opened ticket {} for session {}", ticket_id, session_id);
        } else {
            tracing::debug!("Appended chat exchange to ticket {}", ticket_id);
        }
        Ok((ticket_id, inserted))
    }

    async fn ticket_overview(&self, owner_id: &str) -> ApiResult<TicketOverview> {
        let row = sqlx::query(&format!(
            "SELECT COUNT(*) as total,
                    COALESCE(SUM(CASE WHEN status = 'open' THEN 1 ELSE 0 END), 0) as open,
                    COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0) as in_progress,
                    COALESCE(SUM(CASE WHEN status = 'resolved' THEN 1 ELSE 0 END), 0) as resolved,
                    COALESCE(SUM(CASE WHEN status = 'closed' THEN 1 ELSE 0 END), 0) as closed,
                    AVG(response_time) as avg_response_time,
                    AVG(resolution_time) as avg_resolution_time,
                    AVG(satisfaction) as avg_satisfaction
             FROM tickets
             WHERE {}",
            OWNER_SCOPE
        ))
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(TicketOverview {
            total: row.try_get("total")?,
            open: row.try_get("open")?,
            in_progress: row.try_get("in_progress")?,
            resolved: row.try_get("resolved")?,
            closed: row.try_get("closed")?,
            avg_response_time: nullable::<f64>(&row, "avg_response_time")?
                .unwrap_or(0.0),
            avg_resolution_time: nullable::<f64>(&row, "avg_resolution_time")?
                .unwrap_or(0.0),
            avg_satisfaction: nullable::<f64>(&row, "avg_satisfaction")?
                .unwrap_or(0.0),
        })
    }

    async fn count_by_priority(&self, owner_id: &str) -> ApiResult<Vec<GroupCount>> {
        let rows = sqlx::query(&format!(
            "SELECT priority as group_key, COUNT(*) as count
             FROM tickets
             WHERE {}
             GROUP BY priority
             ORDER BY count DESC",
            OWNER_SCOPE
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        group_counts(&rows)
    }

    async fn top_categories(&self, owner_id: &str, limit: i64) -> ApiResult<Vec<GroupCount>> {
        let rows = sqlx::query(&format!(
            "SELECT category as group_key, COUNT(*) as count
             FROM tickets
             WHERE {}
             GROUP BY category
             ORDER BY count DESC
             LIMIT ?",
            OWNER_SCOPE
        ))
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        group_counts(&rows)
    }

    async fn ticket_user_ids(&self, owner_id: &str) -> ApiResult<Vec<String>> {
        let rows = sqlx::query(&format!(
            "SELECT DISTINCT user_id FROM tickets WHERE user_id IS NOT NULL AND {}",
            OWNER_SCOPE
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok(row.try_get::<String, _>("user_id")?))
            .collect()
    }

    async fn user_ticket_stats(
        &self,
        user_id: &str,
        owner_id: Option<&str>,
    ) -> ApiResult<UserTicketStats> {
        let mut query = QueryBuilder::<Any>::new(
            "SELECT COUNT(*) as total,
                    COALESCE(SUM(CASE WHEN status = 'open' THEN 1 ELSE 0 END), 0) as open,
                    COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0) as in_progress,
                    COALESCE(SUM(CASE WHEN status = 'resolved' THEN 1 ELSE 0 END), 0) as resolved,
                    COALESCE(SUM(CASE WHEN status = 'closed' THEN 1 ELSE 0 END), 0) as closed,
                    AVG(satisfaction) as avg_satisfaction,
                    COALESCE(SUM(interactions), 0) as interactions,
                    MAX(updated_at) as last_activity
             FROM tickets",
        );
        push_user_scope(&mut query, user_id, owner_id);

        let row = query.build().fetch_one(&self.pool).await?;
        Ok(UserTicketStats {
            total_tickets: row.try_get("total")?,
            open_tickets: row.try_get("open")?,
            in_progress_tickets: row.try_get("in_progress")?,
            resolved_tickets: row.try_get("resolved")?,
            closed_tickets: row.try_get("closed")?,
            avg_satisfaction: nullable::<f64>(&row, "avg_satisfaction")?
                .unwrap_or(0.0),
            total_interactions: row.try_get("interactions")?,
            last_activity: nullable(&row, "last_activity")?,
        })
    }

    async fn recent_user_tickets(
        &self,
        user_id: &str,
        owner_id: Option<&str>,
        limit: i64,
    ) -> ApiResult<Vec<Ticket>> {
        let mut query =
            QueryBuilder::<Any>::new(format!("SELECT {} FROM tickets", TICKET_COLUMNS));
        push_user_scope(&mut query, user_id, owner_id);
        query.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);

        let rows = query.build().fetch_all(&self.pool).await?;
        let mut tickets = rows
            .iter()
            .map(ticket_from_row)
            .collect::<ApiResult<Vec<_>>>()?;
        self.attach_messages(&mut tickets).await?;

        Ok(tickets)
    }

    async fn engagement_stats(&self, owner_id: Option<&str>) -> ApiResult<EngagementStats> {
        let mut query = QueryBuilder::<Any>::new(
            "SELECT COUNT(DISTINCT user_id) as engaged,
                    COUNT(*) as tickets,
                    AVG(satisfaction) as avg_satisfaction,
                    COALESCE(SUM(interactions), 0) as interactions
             FROM tickets
             WHERE user_id IS NOT NULL",
        );
        if let Some(owner_id) = owner_id {
            query
                .push(" AND agent_id IN (SELECT id FROM agents WHERE owner_id = ")
                .push_bind(owner_id.to_string())
                .push(")");
        }

        let row = query.build().fetch_one(&self.pool).await?;
        let engaged: i64 = row.try_get("engaged")?;
        let tickets: i64 = row.try_get("tickets")?;
        let interactions: i64 = row.try_get("interactions")?;
        let per_user = |value: i64| {
            if engaged > 0 {
                value as f64 / engaged as f64
            } else {
                0.0
            }
        };

        Ok(EngagementStats {
            engaged_users: engaged,
            avg_tickets_per_user: per_user(tickets),
            avg_satisfaction: nullable::<f64>(&row, "avg_satisfaction")?
                .unwrap_or(0.0),
            avg_interactions_per_user: per_user(interactions),
        })
    }

    async fn agent_performance(&self, agent_id: &str) -> ApiResult<PerformanceMetrics> {
        let row = sqlx::query(
            "SELECT COUNT(*) as total,
                    AVG(response_time) as avg_response_time,
                    AVG(resolution_time) as avg_resolution_time,
                    AVG(satisfaction) as avg_satisfaction,
                    COALESCE(SUM(interactions), 0) as interactions,
                    COALESCE(SUM(CASE WHEN status IN ('resolved', 'closed') THEN 1 ELSE 0 END), 0) as resolved
             FROM tickets
             WHERE agent_id = ?",
        )
        .bind(agent_id)
        .fetch_one(&self.pool)
        .await?;

        let total: i64 = row.try_get("total")?;
        let resolved: i64 = row.try_get("resolved")?;
        Ok(PerformanceMetrics {
            total_tickets: total,
            avg_response_time: nullable::<f64>(&row, "avg_response_time")?
                .unwrap_or(0.0),
            avg_resolution_time: nullable::<f64>(&row, "avg_resolution_time")?
                .unwrap_or(0.0),
            avg_satisfaction: nullable::<f64>(&row, "avg_satisfaction")?
                .unwrap_or(0.0),
            total_interactions: row.try_get("interactions")?,
            resolved_tickets: resolved,
            resolution_rate: resolution_rate(total, resolved),
        })
    }

    async fn agent_categories(&self, agent_id: &str, limit: i64) -> ApiResult<Vec<GroupCount>> {
        let rows = sqlx::query(
            "SELECT category as group_key, COUNT(*) as count
             FROM tickets
             WHERE agent_id = ?
             GROUP BY category
             ORDER BY count DESC
             LIMIT ?",
        )
        .bind(agent_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        group_counts(&rows)
    }

    async fn unresolved_categories(&self, agent_id: &str) -> ApiResult<Vec<GroupCount>> {
        let rows = sqlx::query(
            "SELECT category as group_key, COUNT(*) as count
             FROM tickets
             WHERE agent_id = ? AND status IN ('open', 'in_progress')
             GROUP BY category
             ORDER BY count DESC
             LIMIT 5",
        )
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await?;

        group_counts(&rows)
    }

    async fn satisfaction_trend(
        &self,
        agent_id: &str,
        since: &str,
    ) -> ApiResult<Vec<DailySatisfaction>> {
        let rows = sqlx::query(
            "SELECT substr(created_at, 1, 10) as day,
                    AVG(satisfaction) as avg_satisfaction,
                    COUNT(*) as count
             FROM tickets
             WHERE agent_id = ? AND created_at >= ? AND satisfaction IS NOT NULL
             GROUP BY day
             ORDER BY day",
        )
        .bind(agent_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(DailySatisfaction {
                    date: row.try_get("day")?,
                    avg_satisfaction: nullable::<f64>(row, "avg_satisfaction")?
                        .unwrap_or(0.0),
                    count: row.try_get("count")?,
                })
            })
            .collect()
    }

    async fn recent_feedback(&self, agent_id: &str, limit: i64) -> ApiResult<Vec<RecentFeedback>> {
        let rows = sqlx::query(
            "SELECT t.id as id, t.satisfaction as satisfaction, t.customer_name as customer_name,
                    t.created_at as created_at,
                    (SELECT m.content FROM ticket_messages m
                     WHERE m.ticket_id = t.id
                     ORDER BY m.seq DESC LIMIT 1) as last_message
             FROM tickets t
             WHERE t.agent_id = ?
             ORDER BY t.created_at DESC
             LIMIT ?",
        )
        .bind(agent_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(RecentFeedback {
                    id: row.try_get("id")?,
                    satisfaction: nullable(row, "satisfaction")?,
                    customer_name: nullable(row, "customer_name")?,
                    date: row.try_get("created_at")?,
                    last_message: nullable(row, "last_message")?,
                })
            })
            .collect()
    }

    async fn low_satisfaction_count(&self, agent_id: &str) -> ApiResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM tickets WHERE agent_id = ? AND satisfaction < 3",
        )
        .bind(agent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("count")?)
    }
}
