/// Validate an email address and normalize it to lowercase for storage.
///
/// Returns the human readable reason on failure so callers can attach it to
/// the offending field.
pub fn validate_and_normalize_email(email: &str) -> Result<String, String> {
    let trimmed = email.trim();

    if !email_address::EmailAddress::is_valid(trimmed) {
        return Err("Please enter a valid email".to_string());
    }

    // Require a TLD (dot after @)
    if let Some(at_pos) = trimmed.find('@') {
        let domain_part = &trimmed[at_pos + 1..];
        if !domain_part.contains('.') {
            return Err("Email domain must include a TLD (e.g., .com, .org)".to_string());
        }
    }

    Ok(trimmed.to_lowercase())
}
