//! Configuration types.
//!
//! Only the binary reads the environment; everything below it receives
//! these structs explicitly.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// LDAP directory connection parameters.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub host: String,
    pub port: u16,
    /// DN to bind as before searching.
    pub bind_dn: String,
    pub password: SecretString,
    /// Search base for `(mail=...)` lookups.
    pub base_dn: String,
    /// Upper bound on a single recipient lookup.
    pub query_timeout: Duration,
}

impl DirectoryConfig {
    /// `ldap://host:port`, or `ldaps://` on the well-known TLS port.
    pub fn url(&self) -> String {
        let scheme = if self.port == 636 { "ldaps" } else { "ldap" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

/// SMTP relay used for local delivery.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Upper bound on a single recipient submission.
    pub timeout: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 25,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Bounce notification settings.
#[derive(Debug, Clone)]
pub struct BounceConfig {
    /// Source address of bounce notifications.
    pub source_address: String,
    /// Name of the notification template.
    pub template: String,
}

impl Default for BounceConfig {
    fn default() -> Self {
        Self {
            source_address: "no-reply@localhost".to_string(),
            template: "Bounce".to_string(),
        }
    }
}

/// Templated notification endpoint.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub endpoint: String,
    pub api_key: Option<SecretString>,
}

/// Where raw messages are fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobSource {
    /// `{root}/{container}/{key}` on the local filesystem.
    Filesystem(PathBuf),
    /// `{base_url}/{container}/{key}` over HTTP.
    Http(String),
}

/// Full relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub directory: DirectoryConfig,
    pub delivery: DeliveryConfig,
    pub bounce: BounceConfig,
    pub notifier: NotifierConfig,
    pub blobs: BlobSource,
}

impl RelayConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            var(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let directory = DirectoryConfig {
            host: required("LDAP_HOST")?,
            port: parse_or(&var, "LDAP_PORT", 389)?,
            bind_dn: required("LDAP_DN")?,
            password: SecretString::from(required("LDAP_PASSWORD")?),
            base_dn: required("LDAP_BASEDC")?,
            query_timeout: Duration::from_secs(parse_or(&var, "LDAP_QUERY_TIMEOUT_SECS", 10)?),
        };

        let delivery_defaults = DeliveryConfig::default();
        let delivery = DeliveryConfig {
            smtp_host: var("RELAY_SMTP_HOST").unwrap_or(delivery_defaults.smtp_host),
            smtp_port: parse_or(&var, "RELAY_SMTP_PORT", delivery_defaults.smtp_port)?,
            timeout: Duration::from_secs(parse_or(
                &var,
                "RELAY_DELIVERY_TIMEOUT_SECS",
                delivery_defaults.timeout.as_secs(),
            )?),
        };

        let bounce_defaults = BounceConfig::default();
        let bounce = BounceConfig {
            source_address: var("BOUNCE_SOURCE_ADDRESS").unwrap_or(bounce_defaults.source_address),
            template: var("BOUNCE_TEMPLATE").unwrap_or(bounce_defaults.template),
        };

        let notifier = NotifierConfig {
            endpoint: required("NOTIFY_ENDPOINT")?,
            api_key: var("NOTIFY_API_KEY").map(SecretString::from),
        };

        let blobs = match (var("BLOB_BASE_URL"), var("BLOB_ROOT")) {
            (Some(url), _) => BlobSource::Http(url.trim_end_matches('/').to_string()),
            (None, Some(root)) => BlobSource::Filesystem(PathBuf::from(root)),
            (None, None) => return Err(ConfigError::MissingEnvVar("BLOB_ROOT".to_string())),
        };

        Ok(Self {
            directory,
            delivery,
            bounce,
            notifier,
            blobs,
        })
    }
}

fn parse_or<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("LDAP_HOST", "ldap.internal"),
            ("LDAP_DN", "cn=admin,dc=example,dc=com"),
            ("LDAP_PASSWORD", "hunter2"),
            ("LDAP_BASEDC", "dc=example,dc=com"),
            ("NOTIFY_ENDPOINT", "https://notify.internal/send"),
            ("BLOB_ROOT", "/var/spool/inbound"),
        ])
    }

    fn load(vars: &HashMap<&str, &str>) -> Result<RelayConfig, ConfigError> {
        RelayConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_applied() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(config.directory.port, 389);
        assert_eq!(config.directory.query_timeout, Duration::from_secs(10));
        assert_eq!(config.directory.password.expose_secret(), "hunter2");
        assert_eq!(config.delivery.smtp_host, "localhost");
        assert_eq!(config.delivery.smtp_port, 25);
        assert_eq!(config.bounce.template, "Bounce");
        assert_eq!(config.bounce.source_address, "no-reply@localhost");
        assert!(config.notifier.api_key.is_none());
        assert_eq!(
            config.blobs,
            BlobSource::Filesystem(PathBuf::from("/var/spool/inbound"))
        );
    }

    #[test]
    fn missing_ldap_host_is_reported() {
        let mut vars = base_vars();
        vars.remove("LDAP_HOST");
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "LDAP_HOST"));
    }

    #[test]
    fn blank_required_value_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("LDAP_BASEDC", "   ");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::MissingEnvVar(ref k)) if k == "LDAP_BASEDC"
        ));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut vars = base_vars();
        vars.insert("LDAP_PORT", "not-a-port");
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "LDAP_PORT"));
    }

    #[test]
    fn blob_base_url_wins_over_root() {
        let mut vars = base_vars();
        vars.insert("BLOB_BASE_URL", "https://blobs.internal/");
        let config = load(&vars).unwrap();
        assert_eq!(
            config.blobs,
            BlobSource::Http("https://blobs.internal".to_string())
        );
    }

    #[test]
    fn no_blob_source_is_an_error() {
        let mut vars = base_vars();
        vars.remove("BLOB_ROOT");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn directory_url_scheme_follows_port() {
        let mut config = load(&base_vars()).unwrap().directory;
        assert_eq!(config.url(), "ldap://ldap.internal:389");
        config.port = 636;
        assert_eq!(config.url(), "ldaps://ldap.internal:636");
    }
}
