//! Process configuration read from the environment.

use std::time::Duration;

use axum::http::HeaderValue;
use thiserror::Error;

use tenantchat_infra::StreamConfig;
use tenantchat_infra::provider::stream::DEFAULT_BASE_URL;

use crate::app::cors::AllowedOrigins;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("STREAM_API_KEY and STREAM_API_SECRET must be set together")]
    PartialProviderCredentials,
}

/// Chat provider credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub port: u16,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub migrate_db: bool,
    /// `None` selects the in-memory provider.
    pub provider: Option<ProviderCredentials>,
    pub provider_base_url: String,
    pub provider_timeout: Duration,
    pub public_tenant_listing: bool,
    pub allowed_origins: AllowedOrigins,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("migrate_db", &self.migrate_db)
            .field("provider", &self.provider)
            .field("provider_base_url", &self.provider_base_url)
            .field("provider_timeout", &self.provider_timeout)
            .field("public_tenant_listing", &self.public_tenant_listing)
            .field("allowed_origins", &self.allowed_origins)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value: raw,
                reason: "expected a port number",
            })?,
            None => 8080,
        };

        let provider = match (get("STREAM_API_KEY"), get("STREAM_API_SECRET")) {
            (Some(api_key), Some(api_secret)) => Some(ProviderCredentials { api_key, api_secret }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialProviderCredentials),
        };

        let provider_timeout = match get("PROVIDER_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "PROVIDER_TIMEOUT_SECS",
                        value: raw,
                        reason: "expected a positive number of seconds",
                    });
                }
            },
            None => Duration::from_secs(10),
        };

        Ok(Self {
            jwt_secret,
            port,
            database_url: get("DATABASE_URL"),
            migrate_db: parse_flag("MIGRATE_DB", get("MIGRATE_DB"))?,
            provider,
            provider_base_url: get("STREAM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            provider_timeout,
            public_tenant_listing: parse_flag("PUBLIC_TENANT_LISTING", get("PUBLIC_TENANT_LISTING"))?,
            allowed_origins: parse_origins(get("CORS_ALLOWED_ORIGINS"))?,
        })
    }

    pub fn stream_config(&self) -> Option<StreamConfig> {
        self.provider.as_ref().map(|creds| StreamConfig {
            api_key: creds.api_key.clone(),
            api_secret: creds.api_secret.clone(),
            base_url: self.provider_base_url.clone(),
            timeout: self.provider_timeout,
        })
    }
}

fn parse_flag(var: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "expected true or false",
        }),
    }
}

/// Comma-separated origins; unset or `*` allows any.
fn parse_origins(raw: Option<String>) -> Result<AllowedOrigins, ConfigError> {
    let Some(raw) = raw else {
        return Ok(AllowedOrigins::Any);
    };
    if raw.trim() == "*" {
        return Ok(AllowedOrigins::Any);
    }

    let invalid = || ConfigError::Invalid {
        var: "CORS_ALLOWED_ORIGINS",
        value: raw.clone(),
        reason: "expected '*' or a comma-separated list of origins",
    };
    let origins = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| HeaderValue::from_str(origin).map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    if origins.is_empty() {
        return Err(invalid());
    }
    Ok(AllowedOrigins::List(origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let cfg = config(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.database_url, None);
        assert!(!cfg.migrate_db);
        assert!(cfg.provider.is_none());
        assert!(cfg.stream_config().is_none());
        assert_eq!(cfg.provider_base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.provider_timeout, Duration::from_secs(10));
        assert!(!cfg.public_tenant_listing);
        assert_eq!(cfg.allowed_origins, AllowedOrigins::Any);
    }

    #[test]
    fn missing_or_blank_secret_is_fatal() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::Missing("JWT_SECRET"));
        assert_eq!(
            config(&[("JWT_SECRET", "   ")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let err = config(&[("JWT_SECRET", "s"), ("PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
    }

    #[test]
    fn provider_credentials_come_in_pairs() {
        let err = config(&[("JWT_SECRET", "s"), ("STREAM_API_KEY", "k")]).unwrap_err();
        assert_eq!(err, ConfigError::PartialProviderCredentials);

        let cfg = config(&[
            ("JWT_SECRET", "s"),
            ("STREAM_API_KEY", "k"),
            ("STREAM_API_SECRET", "p"),
            ("PROVIDER_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        let stream = cfg.stream_config().unwrap();
        assert_eq!(stream.api_key, "k");
        assert_eq!(stream.timeout, Duration::from_secs(3));
    }

    #[test]
    fn flags_accept_common_spellings() {
        let cfg = config(&[("JWT_SECRET", "s"), ("MIGRATE_DB", "TRUE"), ("PUBLIC_TENANT_LISTING", "1")]).unwrap();
        assert!(cfg.migrate_db);
        assert!(cfg.public_tenant_listing);

        let err = config(&[("JWT_SECRET", "s"), ("MIGRATE_DB", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "MIGRATE_DB", .. }));
    }

    #[test]
    fn cors_origins_are_a_list_or_any() {
        let cfg = config(&[
            ("JWT_SECRET", "s"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:3000, https://app.example.com"),
        ])
        .unwrap();
        assert_eq!(
            cfg.allowed_origins,
            AllowedOrigins::List(vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("https://app.example.com"),
            ])
        );

        let cfg = config(&[("JWT_SECRET", "s"), ("CORS_ALLOWED_ORIGINS", "*")]).unwrap();
        assert_eq!(cfg.allowed_origins, AllowedOrigins::Any);

        let err = config(&[("JWT_SECRET", "s"), ("CORS_ALLOWED_ORIGINS", " , ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "CORS_ALLOWED_ORIGINS", .. }));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = config(&[
            ("JWT_SECRET", "jwt-very-secret"),
            ("STREAM_API_KEY", "k"),
            ("STREAM_API_SECRET", "provider-very-secret"),
            ("DATABASE_URL", "postgres://u:pw-very-secret@db/x"),
        ])
        .unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("very-secret"));
    }
}
