//! Utility functions for authentication.

use crate::state::DeviceInfo;

/// Normalize an email address for lookup: trim surrounding whitespace
/// and lowercase.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email address format.
///
/// This performs basic RFC 5322 validation:
/// - Must contain exactly one `@`
/// - Must have non-empty local and domain parts
/// - Length must be between 3 and 255 characters
///
/// # Examples
///
/// ```
/// use bankauth::utils::is_valid_email;
///
/// assert!(is_valid_email("user@example.com"));
/// assert!(is_valid_email("user+tag@subdomain.example.com"));
/// assert!(!is_valid_email("invalid"));
/// assert!(!is_valid_email("@example.com"));
/// assert!(!is_valid_email("user@"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return false;
    }

    if !domain.contains('.') {
        return false;
    }

    let valid_local_chars =
        |c: char| c.is_alphanumeric() || c == '.' || c == '-' || c == '+' || c == '_';
    let valid_domain_chars = |c: char| c.is_alphanumeric() || c == '.' || c == '-';

    if !local.chars().all(valid_local_chars) {
        return false;
    }

    if !domain.chars().all(valid_domain_chars) {
        return false;
    }

    // Domain parts between dots must be non-empty
    domain.split('.').all(|part| !part.is_empty())
}

/// Mask an email address for UI display during the MFA step.
///
/// Keeps the first and last character of the local part, masks the rest.
/// Very short local parts are fully masked.
///
/// # Examples
///
/// ```
/// use bankauth::utils::mask_email;
///
/// assert_eq!(mask_email("jane.doe@example.com"), "j******e@example.com");
/// assert_eq!(mask_email("ab@example.com"), "**@example.com");
/// assert_eq!(mask_email("not-an-email"), "***");
/// ```
#[must_use]
pub fn mask_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return "***".to_string();
    };

    let chars: Vec<char> = local.chars().collect();
    if chars.len() <= 2 {
        return format!("{}@{domain}", "*".repeat(chars.len()));
    }

    let first = chars[0];
    let last = chars[chars.len() - 1];
    let masked = "*".repeat(chars.len() - 2);
    format!("{first}{masked}{last}@{domain}")
}

/// Parse device name from a user agent string.
///
/// Attempts to extract a human-readable device name from the user agent.
/// Falls back to generic names if parsing fails.
///
/// # Examples
///
/// ```
/// use bankauth::utils::parse_device_name;
///
/// assert_eq!(parse_device_name("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"), "Mobile Browser");
/// assert_eq!(parse_device_name("Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X)"), "Tablet Browser");
/// assert_eq!(parse_device_name("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"), "Web Browser");
/// ```
#[must_use]
pub fn parse_device_name(user_agent: &str) -> String {
    let ua_lower = user_agent.to_lowercase();

    if ua_lower.contains("iphone") || ua_lower.contains("android") && !ua_lower.contains("tablet")
    {
        return "Mobile Browser".to_string();
    }

    if ua_lower.contains("ipad") || ua_lower.contains("tablet") {
        return "Tablet Browser".to_string();
    }

    "Web Browser".to_string()
}

/// Parse device type from a user agent string.
///
/// Returns one of: "mobile", "tablet", "desktop"
#[must_use]
pub fn parse_device_type(user_agent: &str) -> &'static str {
    let ua_lower = user_agent.to_lowercase();

    if ua_lower.contains("iphone") || ua_lower.contains("android") && !ua_lower.contains("tablet")
    {
        return "mobile";
    }

    if ua_lower.contains("ipad") || ua_lower.contains("tablet") {
        return "tablet";
    }

    "desktop"
}

/// Build the structured device context captured at session creation.
///
/// Name and type come from the user agent; country and city are passed
/// through when the caller resolved them upstream.
#[must_use]
pub fn device_info_from_request(
    user_agent: &str,
    country: Option<String>,
    city: Option<String>,
) -> DeviceInfo {
    DeviceInfo {
        device_name: Some(parse_device_name(user_agent)),
        device_type: Some(parse_device_type(user_agent).to_string()),
        country,
        city,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
        assert_eq!(normalize_email("a@b.c"), "a@b.c");
    }

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@example.com"));
        assert!(is_valid_email("user+tag@example.com"));
        assert!(is_valid_email("user_name@subdomain.example.com"));
        assert!(is_valid_email("user-name@example.co.uk"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("invalid"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("user@example..com"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a@b")); // No dot in domain
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("jane.doe@example.com"), "j******e@example.com");
        assert_eq!(mask_email("jd@example.com"), "**@example.com");
        assert_eq!(mask_email("j@example.com"), "*@example.com");
        assert_eq!(mask_email("garbage"), "***");
    }

    #[test]
    fn test_parse_device_name() {
        assert_eq!(
            parse_device_name("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"),
            "Mobile Browser"
        );
        assert_eq!(
            parse_device_name("Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X)"),
            "Tablet Browser"
        );
        assert_eq!(
            parse_device_name("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"),
            "Web Browser"
        );
    }

    #[test]
    fn test_parse_device_type() {
        assert_eq!(parse_device_type("Mozilla/5.0 (Linux; Android 13)"), "mobile");
        assert_eq!(
            parse_device_type("Mozilla/5.0 (Linux; Android 13; Tablet)"),
            "tablet"
        );
        assert_eq!(
            parse_device_type("Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0)"),
            "desktop"
        );
    }

    #[test]
    fn test_device_info_from_request() {
        let info = device_info_from_request(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)",
            Some("CH".to_string()),
            None,
        );
        assert_eq!(info.device_name.as_deref(), Some("Mobile Browser"));
        assert_eq!(info.device_type.as_deref(), Some("mobile"));
        assert_eq!(info.country.as_deref(), Some("CH"));
        assert!(info.city.is_none());
    }
}
