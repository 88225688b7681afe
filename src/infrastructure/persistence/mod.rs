use sqlx::{
    any::{AnyConnectOptions, AnyPoolOptions, AnyRow},
    Any, AnyPool, ConnectOptions, Decode, Row, Type, TypeInfo, ValueRef,
};
use std::str::FromStr;
use tracing::log::LevelFilter;

use crate::infrastructure::http::middleware::error::ApiResult;

mod agents;
mod tickets;
mod users;

pub struct Database {
    pub(crate) pool: AnyPool,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        // Ensure drivers are installed for AnyPool
        sqlx::any::install_default_drivers();

        let connect_options = AnyConnectOptions::from_str(database_url)?
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, std::time::Duration::from_secs(1));

        let pool = AnyPoolOptions::new()
            .max_connections(10)
            .connect_with(connect_options)
            .await?;

        if database_url.starts_with("sqlite") {
            sqlx::query("PRAGMA journal_mode = WAL")
                .execute(&pool)
                .await?;
            sqlx::query("PRAGMA synchronous = NORMAL")
                .execute(&pool)
                .await?;
        }

        tracing::info!("Database pool ready");
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("migrations/sqlite").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

/// JSON columns hold string lists such as domains and tags.
pub(crate) fn decode_string_list(raw: &str) -> ApiResult<Vec<String>> {
    Ok(serde_json::from_str(raw)?)
}

pub(crate) fn encode_string_list(values: &[String]) -> ApiResult<String> {
    Ok(serde_json::to_string(values)?)
}

pub(crate) fn decode_json(raw: Option<String>) -> ApiResult<Option<serde_json::Value>> {
    match raw {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

pub(crate) fn encode_json(value: Option<&serde_json::Value>) -> ApiResult<Option<String>> {
    match value {
        Some(v) => Ok(Some(serde_json::to_string(v)?)),
        None => Ok(None),
    }
}

/// Read a nullable column.
///
/// The SQLite backend of `Any` reports a stored NULL with a `NULL` type that
/// `Option<T>` refuses to decode, so NULLs are detected on the raw value and
/// only concrete values are decoded.
pub(crate) fn nullable<'r, T>(row: &'r AnyRow, column: &str) -> ApiResult<Option<T>>
where
    T: Decode<'r, Any> + Type<Any>,
{
    let raw = row.try_get_raw(column)?;
    let type_info = raw.type_info();
    if raw.is_null() || type_info.is_null() || type_info.name().eq_ignore_ascii_case("NULL") {
        return Ok(None);
    }
    Ok(Some(row.try_get::<T, _>(column)?))
}

/// Parse a stored enum column, surfacing corrupt values as internal errors.
pub(crate) fn parse_column<T>(value: &str) -> ApiResult<T>
where
    T: FromStr<Err = String>,
{
    value
        .parse()
        .map_err(crate::infrastructure::http::middleware::error::ApiError::Internal)
}
