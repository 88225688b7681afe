use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};

/// A single rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Collects field errors while a request is checked, then converts into
/// `ApiError::Validation` if anything was rejected.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn required(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.push(field, message);
        }
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.push(field, format!("Must be at most {} characters", max));
        }
    }

    pub fn len_between(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.trim().chars().count();
        if len < min {
            self.push(field, format!("Must be at least {} characters", min));
        } else if len > max {
            self.push(field, format!("Must be at most {} characters", max));
        }
    }

    pub fn each_max_len(&mut self, field: &str, values: &[String], max: usize) {
        for (index, value) in values.iter().enumerate() {
            self.max_len(&format!("{}[{}]", field, index), value, max);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> ApiResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

fn hex_color_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").expect("hex colour pattern is valid")
    })
}

fn domain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-z0-9]+(-[a-z0-9]+)*\.)+[a-z]{2,}$").expect("domain pattern is valid")
    })
}

pub fn is_hex_color(value: &str) -> bool {
    hex_color_regex().is_match(value)
}

/// Allowed embedding domain: a lowercase DNS name or the `*` wildcard.
pub fn is_allowed_domain_pattern(value: &str) -> bool {
    value == "*" || domain_regex().is_match(value)
}

pub fn is_http_url(value: &str) -> bool {
    match reqwest::Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colors() {
        assert!(is_hex_color("#3b82f6"));
        assert!(is_hex_color("#FFF"));
        assert!(!is_hex_color("3b82f6"));
        assert!(!is_hex_color("#12345"));
        assert!(!is_hex_color("#gggggg"));
    }

    #[test]
    fn test_domain_patterns() {
        assert!(is_allowed_domain_pattern("example.com"));
        assert!(is_allowed_domain_pattern("shop.my-site.co.uk"));
        assert!(is_allowed_domain_pattern("*"));
        assert!(!is_allowed_domain_pattern("Example.com"));
        assert!(!is_allowed_domain_pattern("https://example.com"));
        assert!(!is_allowed_domain_pattern("localhost"));
    }

    #[test]
    fn test_http_urls() {
        assert!(is_http_url("https://agent-prod.studio.lyzr.ai/v3/inference/chat/"));
        assert!(is_http_url("http://localhost:8080/chat"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("not a url"));
    }

    #[test]
    fn test_len_between_counts_chars() {
        let mut errors = FieldErrors::new();
        errors.len_between("name", "é", 2, 10);
        assert!(!errors.is_empty());

        let mut errors = FieldErrors::new();
        errors.len_between("name", "éé", 2, 10);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_into_result_carries_every_field() {
        let mut errors = FieldErrors::new();
        errors.required("message", "  ", "Message is required");
        errors.max_len("title", &"x".repeat(51), 50);

        match errors.into_result() {
            Err(ApiError::Validation(fields)) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["message", "title"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
