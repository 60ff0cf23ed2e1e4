//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPWAVE_DATA_URL` - GraphQL endpoint of the managed data service
//! - `SHOPWAVE_API_KEY` - API key for guest (read) access
//!
//! ## Optional
//! - `SHOPWAVE_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `SHOPWAVE_TAX_RATE` - Tax rate shown in the order summary (default: 0.10)
//! - `SHOPWAVE_SESSION_DIR` - Directory for session cart files (default: .shopwave/sessions)
//! - `SHOPWAVE_USER_ID` - Signed-in user id
//! - `SHOPWAVE_USER_EMAIL` - Signed-in user email
//! - `SHOPWAVE_USER_TOKEN` - Signed-in user's access token
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TAX_RATE: &str = "0.10";
const DEFAULT_SESSION_DIR: &str = ".shopwave/sessions";
const MIN_API_KEY_LENGTH: usize = 16;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Managed data service connection; `None` when loaded for offline use
    pub data: Option<DataServiceConfig>,
    /// Tax rate applied in the order summary (display only)
    pub tax_rate: Decimal,
    /// Directory holding one cart file per session
    pub session_dir: PathBuf,
    /// Pre-configured signed-in identity
    pub auth: AuthConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Managed data service connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct DataServiceConfig {
    /// GraphQL endpoint
    pub endpoint: Url,
    /// API key for guest reads
    pub api_key: SecretString,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl std::fmt::Debug for DataServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataServiceConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Signed-in identity supplied through the environment.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// User id (the identity provider's subject)
    pub user_id: Option<String>,
    /// User email
    pub email: Option<String>,
    /// User access token for owner writes
    pub token: Option<SecretString>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the API key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration without the data service settings.
    ///
    /// Used when the session runs against the in-process data service.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an optional variable is present but invalid.
    pub fn offline_from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Self::offline_from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);
        let data = DataServiceConfig::from_env(&env)?;
        Self::load(&env, Some(data))
    }

    /// Offline counterpart of [`StorefrontConfig::from_lookup`].
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::offline_from_env`].
    pub fn offline_from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::load(&Env(&lookup), None)
    }

    /// The data service settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] for a config loaded offline.
    pub fn data_service(&self) -> Result<&DataServiceConfig, ConfigError> {
        self.data
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("SHOPWAVE_DATA_URL".to_string()))
    }

    fn load(env: &Env<'_>, data: Option<DataServiceConfig>) -> Result<Self, ConfigError> {
        let tax_rate = parse_tax_rate(&env.or_default("SHOPWAVE_TAX_RATE", DEFAULT_TAX_RATE))?;
        let session_dir =
            PathBuf::from(env.or_default("SHOPWAVE_SESSION_DIR", DEFAULT_SESSION_DIR));

        let auth = AuthConfig {
            user_id: env.optional("SHOPWAVE_USER_ID"),
            email: env.optional("SHOPWAVE_USER_EMAIL"),
            token: env.optional("SHOPWAVE_USER_TOKEN").map(SecretString::from),
        };

        Ok(Self {
            data,
            tax_rate,
            session_dir,
            auth,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

impl DataServiceConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let raw_endpoint = env.required("SHOPWAVE_DATA_URL")?;
        let endpoint = Url::parse(&raw_endpoint).map_err(|e| {
            ConfigError::InvalidEnvVar("SHOPWAVE_DATA_URL".to_string(), e.to_string())
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPWAVE_DATA_URL".to_string(),
                format!("unsupported scheme '{}'", endpoint.scheme()),
            ));
        }

        let api_key = SecretString::from(env.required("SHOPWAVE_API_KEY")?);
        validate_api_key(&api_key, "SHOPWAVE_API_KEY")?;

        let timeout_secs = env
            .or_default(
                "SHOPWAVE_REQUEST_TIMEOUT_SECS",
                &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
            )
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "SHOPWAVE_REQUEST_TIMEOUT_SECS".to_string(),
                    e.to_string(),
                )
            })?;

        Ok(Self {
            endpoint,
            api_key,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the usual required/optional/default accessors.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// Parse a tax rate in `[0, 1]`.
fn parse_tax_rate(raw: &str) -> Result<Decimal, ConfigError> {
    let invalid =
        |reason: String| ConfigError::InvalidEnvVar("SHOPWAVE_TAX_RATE".to_string(), reason);

    let rate = Decimal::from_str(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(invalid(format!("must be between 0 and 1 (got {rate})")));
    }
    Ok(rate)
}

/// Reject API keys that are too short or look like placeholders.
fn validate_api_key(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_API_KEY_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_API_KEY_LENGTH} characters (got {})",
                value.len()
            ),
        ));
    }

    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const API_KEY: &str = "da2-k7q9x2m4v8z1w3p6r5t0";

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load(&[
            ("SHOPWAVE_DATA_URL", "https://api.shopwave.test/graphql"),
            ("SHOPWAVE_API_KEY", API_KEY),
        ])
        .unwrap();

        let data = config.data_service().unwrap();
        assert_eq!(data.endpoint.host_str(), Some("api.shopwave.test"));
        assert_eq!(data.request_timeout, Duration::from_secs(10));
        assert_eq!(config.tax_rate, Decimal::new(10, 2));
        assert_eq!(config.session_dir, PathBuf::from(".shopwave/sessions"));
        assert!(config.auth.user_id.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_offline_config_skips_data_service() {
        let config = StorefrontConfig::offline_from_lookup(|key| {
            (key == "SHOPWAVE_TAX_RATE").then(|| "0.2".to_string())
        })
        .unwrap();
        assert!(config.data.is_none());
        assert!(matches!(
            config.data_service(),
            Err(ConfigError::MissingEnvVar(_))
        ));
        assert_eq!(config.tax_rate, Decimal::new(2, 1));
    }

    #[test]
    fn test_missing_endpoint() {
        let err = load(&[("SHOPWAVE_API_KEY", API_KEY)]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "SHOPWAVE_DATA_URL"));
    }

    #[test]
    fn test_endpoint_scheme_rejected() {
        let err = load(&[
            ("SHOPWAVE_DATA_URL", "ftp://api.shopwave.test/graphql"),
            ("SHOPWAVE_API_KEY", API_KEY),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_placeholder_api_key_rejected() {
        let err = load(&[
            ("SHOPWAVE_DATA_URL", "https://api.shopwave.test/graphql"),
            ("SHOPWAVE_API_KEY", "your-api-key-goes-here"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_short_api_key_rejected() {
        let err = load(&[
            ("SHOPWAVE_DATA_URL", "https://api.shopwave.test/graphql"),
            ("SHOPWAVE_API_KEY", "da2-short"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_tax_rate_bounds() {
        assert_eq!(parse_tax_rate("0").unwrap(), Decimal::ZERO);
        assert_eq!(parse_tax_rate(" 0.075 ").unwrap(), Decimal::new(75, 3));
        assert!(parse_tax_rate("1.5").is_err());
        assert!(parse_tax_rate("-0.1").is_err());
        assert!(parse_tax_rate("ten percent").is_err());
    }

    #[test]
    fn test_identity_and_redacted_debug() {
        let config = load(&[
            ("SHOPWAVE_DATA_URL", "https://api.shopwave.test/graphql"),
            ("SHOPWAVE_API_KEY", API_KEY),
            ("SHOPWAVE_USER_ID", "sub-123"),
            ("SHOPWAVE_USER_EMAIL", "shopper@shopwave.test"),
            ("SHOPWAVE_USER_TOKEN", "eyJhbGciOiJSUzI1NiJ9.token"),
        ])
        .unwrap();

        assert_eq!(config.auth.user_id.as_deref(), Some("sub-123"));
        let debug = format!("{config:?}");
        assert!(!debug.contains(API_KEY));
        assert!(!debug.contains("eyJhbGciOiJSUzI1NiJ9"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_blank_values_treated_as_missing() {
        let config = load(&[
            ("SHOPWAVE_DATA_URL", "https://api.shopwave.test/graphql"),
            ("SHOPWAVE_API_KEY", API_KEY),
            ("SHOPWAVE_USER_ID", "  "),
        ])
        .unwrap();
        assert!(config.auth.user_id.is_none());
    }
}
