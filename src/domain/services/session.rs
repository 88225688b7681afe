use chrono::{DateTime, Utc};

pub const ANONYMOUS_CALLER: &str = "anonymous";

/// Identifier for a caller the upstream sees as `user_id`.
pub fn caller_identity(caller_ip: Option<&str>) -> String {
    caller_ip
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(ANONYMOUS_CALLER)
        .to_string()
}

/// Mint a session id of the form `{upstream_agent_id}-{caller}-{unix_millis}`.
pub fn mint_session_id(upstream_agent_id: &str, caller: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}-{}", upstream_agent_id, caller, now.timestamp_millis())
}
