use chrono::{DateTime, NaiveDate, Utc};
use crate::error::AppError;

pub const MAX_SHORT_TEXT: usize = 200;
pub const MAX_LONG_TEXT: usize = 2000;
pub const MAX_SLOT_LABEL: usize = 32;

pub fn sanitize(value: &str, max_chars: usize) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(max_chars)
        .collect::<String>()
        .trim_end()
        .to_string()
}

pub fn optional(value: Option<&str>, max_chars: usize) -> Option<String> {
    value
        .map(|v| sanitize(v, max_chars))
        .filter(|v| !v.is_empty())
}

pub fn required(field: &str, value: Option<&str>, max_chars: usize) -> Result<String, AppError> {
    optional(value, max_chars).ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

pub fn min_chars(field: &str, value: &str, min: usize) -> Result<(), AppError> {
    if value.chars().count() < min {
        return Err(AppError::Validation(format!("{} must be at least {} characters", field, min)));
    }
    Ok(())
}

pub fn max_chars(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!("{} must be at most {} characters", field, max)));
    }
    Ok(())
}

pub fn email(field: &str, value: &str) -> Result<String, AppError> {
    let normalized = value.trim().to_lowercase();
    let valid = match normalized.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !normalized.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(AppError::Validation(format!("{} is not a valid email address", field)));
    }
    Ok(normalized)
}

pub fn phone(value: &str) -> Result<String, AppError> {
    let allowed = value.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    if !allowed || !(7..=15).contains(&digits) {
        return Err(AppError::Validation("Phone number is not valid".into()));
    }
    Ok(value.trim().to_string())
}

// Full timestamps (Date.toISOString()) are taken as their UTC date.
pub fn booking_date(value: &str) -> Result<NaiveDate, AppError> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    if value.len() > 10 && value.is_char_boundary(10) {
        if let Ok(date) = NaiveDate::parse_from_str(&value[..10], "%Y-%m-%d") {
            return Ok(date);
        }
    }
    Err(AppError::Validation("Invalid date".into()))
}

pub fn url(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let host = candidate
        .split_once("://")
        .map(|(_, rest)| rest.split(['/', '?', '#']).next().unwrap_or_default())
        .unwrap_or_default();

    if !(candidate.starts_with("http://") || candidate.starts_with("https://")) || !host.contains('.') {
        return Err(AppError::Validation(format!("{} is not a valid URL", field)));
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_chars_rejects_instead_of_truncating() {
        assert!(max_chars("Time", "10:00 AM", MAX_SLOT_LABEL).is_ok());
        assert!(max_chars("Time", &"9".repeat(MAX_SLOT_LABEL), MAX_SLOT_LABEL).is_ok());
        assert!(matches!(max_chars("Time", &"9".repeat(MAX_SLOT_LABEL + 1), MAX_SLOT_LABEL), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_sanitize_strips_controls_and_caps() {
        assert_eq!(sanitize("  Asha\u{0007} Rao  ", 50), "Asha Rao");
        assert_eq!(sanitize("line one\nline two", 50), "line one\nline two");
        assert_eq!(sanitize("abcdef", 3), "abc");
    }

    #[test]
    fn test_required_rejects_blank() {
        assert!(matches!(required("Name", Some("   "), 10), Err(AppError::Validation(_))));
        assert!(matches!(required("Name", None, 10), Err(AppError::Validation(_))));
        assert_eq!(required("Name", Some(" Asha "), 10).unwrap(), "Asha");
    }

    #[test]
    fn test_email_shapes() {
        assert_eq!(email("Email", " Asha@X.com ").unwrap(), "asha@x.com");
        assert!(email("Email", "asha.x.com").is_err());
        assert!(email("Email", "asha@localhost").is_err());
        assert!(email("Email", "as ha@x.com").is_err());
        assert!(email("Email", "a@b@c.com").is_err());
    }

    #[test]
    fn test_phone_shapes() {
        assert!(phone("9999999999").is_ok());
        assert!(phone("+91 98765-43210").is_ok());
        assert!(phone("12345").is_err());
        assert!(phone("call me").is_err());
    }

    #[test]
    fn test_booking_date_normalization() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(booking_date("2025-03-10").unwrap(), expected);
        assert_eq!(booking_date("2025-03-10T00:00:00.000Z").unwrap(), expected);
        assert_eq!(booking_date("2025-03-10T23:30:00-02:00").unwrap(), NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
        assert!(booking_date("10/03/2025").is_err());
        assert!(booking_date("").is_err());
    }

    #[test]
    fn test_url_gets_scheme() {
        assert_eq!(url("Website", "raoandco.in").unwrap(), "https://raoandco.in");
        assert_eq!(url("Website", "http://rao.in/blog").unwrap(), "http://rao.in/blog");
        assert!(url("Website", "not a site").is_err());
        assert!(url("Website", "ftp://rao.in").is_err());
    }
}
