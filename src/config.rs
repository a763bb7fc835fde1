use std::env;

use anyhow::Context;

use crate::models::settings::ViewMode;

/// Format used in query strings and forms to identify a day or a week.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const AUTH_COOKIE: &str = "sk-auth-cookie";
pub const REFRESH_COOKIE: &str = "sk-refresh-token";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,
    pub jwt_refresh_ttl_secs: i64,
    pub cookie_secure: bool,

    pub registration_open: bool,
    pub default_view_mode: ViewMode,
    pub per_page: i64,
    pub api_page_size: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .context("PORT must be a number")?,
            cors_allowed_origins: parse_csv(
                &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost".into()),
            ),

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            // 5 days
            jwt_access_ttl_secs: env::var("JWT_ACCESS_TTL_SECS")
                .unwrap_or_else(|_| "432000".into())
                .parse()
                .context("JWT_ACCESS_TTL_SECS must be a number")?,
            jwt_refresh_ttl_secs: env::var("JWT_REFRESH_TTL_SECS")
                .unwrap_or_else(|_| "432000".into())
                .parse()
                .context("JWT_REFRESH_TTL_SECS must be a number")?,
            cookie_secure: parse_bool(env::var("SESSION_COOKIE_SECURE").ok(), false),

            registration_open: parse_bool(env::var("REGISTRATION_OPEN").ok(), false),
            default_view_mode: env::var("DEFAULT_VIEW_MODE")
                .ok()
                .and_then(|v| ViewMode::parse(&v))
                .unwrap_or(ViewMode::Lines),
            per_page: env::var("PER_PAGE")
                .unwrap_or_else(|_| "25".into())
                .parse()
                .unwrap_or(25),
            api_page_size: env::var("API_PAGE_SIZE")
                .unwrap_or_else(|_| "7".into())
                .parse()
                .unwrap_or(7),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(str::trim) {
        Some("1") | Some("true") | Some("True") | Some("yes") | Some("on") => true,
        Some("0") | Some("false") | Some("False") | Some("no") | Some("off") => false,
        _ => default,
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/moodcal_test".into(),
            host: "127.0.0.1".into(),
            port: 0,
            cors_allowed_origins: vec!["http://localhost".into()],
            jwt_secret: "test-secret".into(),
            jwt_access_ttl_secs: 900,
            jwt_refresh_ttl_secs: 3600,
            cookie_secure: false,
            registration_open: false,
            default_view_mode: ViewMode::Lines,
            per_page: 25,
            api_page_size: 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_trims_and_drops_empty() {
        assert_eq!(
            parse_csv(" http://a , ,http://b"),
            vec!["http://a".to_string(), "http://b".to_string()]
        );
    }

    #[test]
    fn test_parse_bool_falls_back_to_default() {
        assert!(parse_bool(Some("True".into()), false));
        assert!(!parse_bool(Some("off".into()), true));
        assert!(parse_bool(Some("maybe".into()), true));
        assert!(!parse_bool(None, false));
    }
}
