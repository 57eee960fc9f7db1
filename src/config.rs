use crate::error::AppError;
use std::env;
use std::str::FromStr;

/// Marker the hosted-database URL carries until a real project is wired in.
pub const PLACEHOLDER_DATABASE_HOST: &str = "placeholder";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: Option<String>,
    pub port: u16,
    pub resend_api_key: Option<String>,
    pub resend_api_url: String,
    pub mail_from: String,
    pub team_email: String,
    pub hubspot_access_token: Option<String>,
    pub hubspot_api_url: String,
    pub business_timezone: String,
    pub site_url: String,
    pub allowed_origins: Vec<String>,
    pub admin_email: Option<String>,
    pub degraded_alert_threshold: u64,
    pub default_commission_rate: i32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let site_url = env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let allowed_origins = non_empty_var("ALLOWED_ORIGINS").unwrap_or_else(|| site_url.clone());

        Ok(Self {
            database_url: non_empty_var("DATABASE_URL"),
            port: parsed_var("PORT", 3000)?,
            resend_api_key: non_empty_var("RESEND_API_KEY"),
            resend_api_url: env::var("RESEND_API_URL").unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| "Practice Demo <demo@notifications.example.in>".to_string()),
            team_email: env::var("TEAM_EMAIL").unwrap_or_else(|_| "sales@example.in".to_string()),
            hubspot_access_token: non_empty_var("HUBSPOT_ACCESS_TOKEN"),
            hubspot_api_url: env::var("HUBSPOT_API_URL").unwrap_or_else(|_| "https://api.hubapi.com".to_string()),
            business_timezone: env::var("BUSINESS_TIMEZONE").unwrap_or_else(|_| "Asia/Kolkata".to_string()),
            allowed_origins: origin_list(&allowed_origins),
            site_url,
            admin_email: non_empty_var("ADMIN_EMAIL"),
            degraded_alert_threshold: parsed_var("DEGRADED_ALERT_THRESHOLD", 5)?,
            default_commission_rate: parsed_var("DEFAULT_COMMISSION_RATE", 10)?,
        })
    }

    pub fn configured_database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .filter(|url| !url.contains(PLACEHOLDER_DATABASE_HOST))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

fn parsed_var<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match non_empty_var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("{} must be a number, got {:?}", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            database_url: None,
            port: 0,
            resend_api_key: None,
            resend_api_url: "http://localhost".to_string(),
            mail_from: "from@example.in".to_string(),
            team_email: "team@example.in".to_string(),
            hubspot_access_token: None,
            hubspot_api_url: "http://localhost".to_string(),
            business_timezone: "Asia/Kolkata".to_string(),
            site_url: "http://localhost".to_string(),
            allowed_origins: vec!["http://localhost".to_string()],
            admin_email: None,
            degraded_alert_threshold: 5,
            default_commission_rate: 10,
        }
    }

    #[test]
    fn test_origin_list_splits_and_trims() {
        assert_eq!(
            origin_list(" https://example.in/, https://www.example.in ,,"),
            vec!["https://example.in".to_string(), "https://www.example.in".to_string()]
        );
        assert!(origin_list("  ").is_empty());
    }

    #[test]
    fn test_placeholder_database_url_counts_as_unconfigured() {
        let mut config = base();
        assert!(config.configured_database_url().is_none());

        config.database_url = Some("https://placeholder.supabase.co".to_string());
        assert!(config.configured_database_url().is_none());

        config.database_url = Some("postgres://app:secret@db:5432/practice".to_string());
        assert_eq!(config.configured_database_url(), Some("postgres://app:secret@db:5432/practice"));
    }
}
