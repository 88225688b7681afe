use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp as RFC 3339 with fixed microsecond precision.
///
/// The fixed width keeps stored timestamps lexicographically sortable, which
/// the message log relies on when ordering by `created_at`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Minutes elapsed between two stored timestamps, as a float.
pub fn minutes_between(from: &str, to: &str) -> Option<f64> {
    let from = parse_timestamp(from)?;
    let to = parse_timestamp(to)?;
    let millis = (to - from).num_milliseconds().max(0);
    Some(millis as f64 / 60_000.0)
}

/// Full days since `from`; 0 for unparseable or future timestamps.
pub fn days_since(from: &str, now: DateTime<Utc>) -> i64 {
    parse_timestamp(from)
        .map(|from| (now - from).num_days().max(0))
        .unwrap_or(0)
}
