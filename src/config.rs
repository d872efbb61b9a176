use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::query::PageLimits;

/// Largest page size either limit setting may take.
pub const PAGE_LIMIT_CEILING: usize = 1000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    // the demo catalog is served when unset
    pub database_url: Option<String>,
    pub database_name: String,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub rate_limit_sweep: Duration,
    pub page_limits: PageLimits,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let server_port = parse_or(&lookup, "SERVER_PORT", 8080)?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let database_name = lookup("DATABASE_NAME").unwrap_or_else(|| "storefront".to_string());

        let rate_limit_max = parse_or(&lookup, "RATE_LIMIT_MAX", 30)?;
        let window_ms: u64 = parse_or(&lookup, "RATE_LIMIT_WINDOW_MS", 60_000)?;
        if window_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_WINDOW_MS",
                reason: "must be greater than zero".to_string(),
            });
        }
        let sweep_secs: u64 = parse_or(&lookup, "RATE_LIMIT_SWEEP_SECS", 60)?;

        let default_limit: usize = parse_or(&lookup, "DEFAULT_PAGE_LIMIT", 10)?;
        let max_limit: usize = parse_or(&lookup, "MAX_PAGE_LIMIT", 50)?;
        for (key, value) in [("DEFAULT_PAGE_LIMIT", default_limit), ("MAX_PAGE_LIMIT", max_limit)] {
            if value == 0 || value > PAGE_LIMIT_CEILING {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("must be between 1 and {}", PAGE_LIMIT_CEILING),
                });
            }
        }

        Ok(AppConfig {
            server_host,
            server_port,
            database_url,
            database_name,
            rate_limit_max,
            rate_limit_window: Duration::from_millis(window_ms),
            rate_limit_sweep: Duration::from_secs(sweep_secs.max(1)),
            page_limits: PageLimits {
                default_limit,
                max_limit,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_listing_endpoint() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_address(), "127.0.0.1:8080");
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.rate_limit_max, 30);
        assert_eq!(cfg.rate_limit_window, Duration::from_secs(60));
        assert_eq!(cfg.page_limits, PageLimits::default());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("SERVER_PORT", "9000"),
            ("DATABASE_URL", "mongodb://localhost:27017"),
            ("RATE_LIMIT_MAX", "5"),
            ("RATE_LIMIT_WINDOW_MS", "1500"),
            ("MAX_PAGE_LIMIT", "100"),
        ])
        .unwrap();
        assert_eq!(cfg.server_port, 9000);
        assert_eq!(cfg.database_url.as_deref(), Some("mongodb://localhost:27017"));
        assert_eq!(cfg.rate_limit_max, 5);
        assert_eq!(cfg.rate_limit_window, Duration::from_millis(1500));
        assert_eq!(cfg.page_limits.max_limit, 100);
    }

    #[test]
    fn invalid_values_name_their_key() {
        let err = config(&[("SERVER_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));

        let err = config(&[("RATE_LIMIT_WINDOW_MS", "0")]).unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_WINDOW_MS"));
    }

    #[test]
    fn page_limits_are_bounded() {
        let err = config(&[("MAX_PAGE_LIMIT", "18446744073709551615")]).unwrap_err();
        assert!(err.to_string().contains("MAX_PAGE_LIMIT"));

        let err = config(&[("DEFAULT_PAGE_LIMIT", "0")]).unwrap_err();
        assert!(err.to_string().contains("DEFAULT_PAGE_LIMIT"));

        let cfg = config(&[("MAX_PAGE_LIMIT", "1000")]).unwrap();
        assert_eq!(cfg.page_limits.max_limit, PAGE_LIMIT_CEILING);
    }
}
