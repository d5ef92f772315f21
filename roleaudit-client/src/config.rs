//! Instance configuration.
//!
//! Connection settings for a ServiceNow instance, loaded from environment
//! variables with defaults for everything except the instance and credentials.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Connection settings for one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Base URL of the instance (e.g., "https://dev12345.service-now.com").
    pub instance_url: String,

    /// User name for basic authentication.
    pub username: Option<String>,

    /// Password for basic authentication.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Rows requested per page of a table query.
    pub page_limit: u32,

    /// Whether to verify TLS certificates (disable only for testing).
    pub verify_tls: bool,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            instance_url: String::new(),
            username: None,
            password: None,
            timeout_secs: 30,
            page_limit: 10_000,
            verify_tls: true,
        }
    }
}

impl InstanceConfig {
    /// Configuration for `instance_url` with default settings.
    pub fn new(instance_url: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into(),
            ..Self::default()
        }
    }

    /// Set basic authentication credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SERVICENOW_INSTANCE_URL`: Instance base URL
    /// - `SERVICENOW_INSTANCE_NAME`: Instance name, used as
    ///   `https://<name>.service-now.com` when no URL is set
    /// - `SERVICENOW_USERNAME`: Basic auth user name
    /// - `SERVICENOW_PASSWORD`: Basic auth password
    /// - `SERVICENOW_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    /// - `SERVICENOW_PAGE_LIMIT`: Rows per query page (default: 10000)
    /// - `SERVICENOW_VERIFY_TLS`: Whether to verify TLS (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let instance_url = var("SERVICENOW_INSTANCE_URL")
            .or_else(|| var("SERVICENOW_INSTANCE_NAME").map(|name| format!("https://{}.service-now.com", name)))
            .unwrap_or(default.instance_url);

        Self {
            instance_url,
            username: var("SERVICENOW_USERNAME"),
            password: var("SERVICENOW_PASSWORD"),
            timeout_secs: var("SERVICENOW_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            page_limit: var("SERVICENOW_PAGE_LIMIT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.page_limit),
            verify_tls: var("SERVICENOW_VERIFY_TLS")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.verify_tls),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build a full URL by appending a path to the instance URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.instance_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Check that the instance and credentials are configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instance_url.is_empty() {
            return Err(ConfigError::MissingEnvVar("SERVICENOW_INSTANCE_URL".to_string()));
        }
        if !self.instance_url.starts_with("http://") && !self.instance_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "SERVICENOW_INSTANCE_URL".to_string(),
                message: format!("'{}' is not an http(s) URL", self.instance_url),
            });
        }
        if self.username.is_none() {
            return Err(ConfigError::MissingEnvVar("SERVICENOW_USERNAME".to_string()));
        }
        if self.password.is_none() {
            return Err(ConfigError::MissingEnvVar("SERVICENOW_PASSWORD".to_string()));
        }
        if self.page_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SERVICENOW_PAGE_LIMIT".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = InstanceConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.page_limit, 10_000);
        assert!(config.verify_tls);
    }

    #[test]
    fn test_from_lookup() {
        let config = InstanceConfig::from_lookup(lookup(&[
            ("SERVICENOW_INSTANCE_URL", "https://acme.service-now.com/"),
            ("SERVICENOW_USERNAME", "auditor"),
            ("SERVICENOW_PASSWORD", "secret"),
            ("SERVICENOW_TIMEOUT_SECS", "5"),
            ("SERVICENOW_VERIFY_TLS", "false"),
        ]));

        assert_eq!(config.instance_url, "https://acme.service-now.com/");
        assert_eq!(config.username.as_deref(), Some("auditor"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.page_limit, 10_000);
        assert!(!config.verify_tls);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_instance_name_fallback() {
        let config = InstanceConfig::from_lookup(lookup(&[("SERVICENOW_INSTANCE_NAME", "dev42")]));
        assert_eq!(config.instance_url, "https://dev42.service-now.com");
    }

    #[test]
    fn test_unparseable_numbers_use_defaults() {
        let config = InstanceConfig::from_lookup(lookup(&[("SERVICENOW_PAGE_LIMIT", "lots")]));
        assert_eq!(config.page_limit, 10_000);
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            InstanceConfig::default().validate(),
            Err(ConfigError::MissingEnvVar("SERVICENOW_INSTANCE_URL".into()))
        );
        assert_eq!(
            InstanceConfig::new("https://x.service-now.com").validate(),
            Err(ConfigError::MissingEnvVar("SERVICENOW_USERNAME".into()))
        );
        assert!(matches!(
            InstanceConfig::new("x.service-now.com").with_credentials("u", "p").validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_url() {
        let config = InstanceConfig::new("https://x.service-now.com/");
        assert_eq!(
            config.url("/api/now/table/sys_user_role"),
            "https://x.service-now.com/api/now/table/sys_user_role"
        );
    }
}
