//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PORTAL_SECRET_KEY` - Session signing secret (min 32 chars, high entropy)
//! - `DB_PASSWORD` - Database password (unless `DATABASE_URL` is set)
//!
//! ## Optional
//! - `DATABASE_URL` - Full `PostgreSQL` connection string, overrides the `DB_*` parts
//! - `DB_USER` - Database user (default: portal)
//! - `DB_HOST` - Database host (default: localhost)
//! - `DB_PORT` - Database port (default: 5432)
//! - `DB_NAME` - Database name (default: `login_db`)
//! - `PORTAL_HOST` - Bind address (default: 127.0.0.1)
//! - `PORTAL_PORT` - Listen port (default: 5000)
//! - `PORTAL_BASE_URL` - Public URL (default: <http://localhost:5000>)
//! - `MAIL_SERVER` - SMTP relay (default: smtp.gmail.com)
//! - `MAIL_PORT` - SMTP port (default: 587)
//! - `MAIL_USERNAME` / `MAIL_PASSWORD` - SMTP credentials
//! - `MAIL_FROM` - Sender address (default: `MAIL_USERNAME`)
//! - `ADMIN_EMAIL` - Recipient of new-registration notices
//! - `MAIL_TIMEOUT_SECS` - SMTP timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//!
//! Mail is enabled only when `MAIL_USERNAME`, `MAIL_PASSWORD`, and
//! `ADMIN_EMAIL` are all present.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
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

/// Portal application configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the portal
    pub base_url: String,
    /// Session signing secret
    pub secret_key: SecretString,
    /// Outbound mail settings, absent when mail is not configured
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// SMTP settings for registration notices.
///
/// Implements `Debug` manually to redact the SMTP password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP relay host
    pub smtp_host: String,
    /// SMTP relay port (STARTTLS)
    pub smtp_port: u16,
    /// SMTP username
    pub smtp_username: String,
    /// SMTP password
    pub smtp_password: SecretString,
    /// Sender address
    pub from_address: String,
    /// Recipient of new-registration notices
    pub admin_address: String,
    /// Connection and command timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("admin_address", &self.admin_address)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Pieces of a `PostgreSQL` URL supplied as separate variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseParts {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

impl DatabaseParts {
    /// Assemble a connection URL, percent-encoding the credentials.
    #[must_use]
    pub fn to_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            self.name
        )
    }
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = database_url_from_env()?;
        let host = get_env_or_default("PORTAL_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_HOST".to_string(), e.to_string()))?;
        let port = parse_env_or_default("PORTAL_PORT", 5000_u16)?;
        let base_url = get_env_or_default("PORTAL_BASE_URL", "http://localhost:5000");
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("PORTAL_BASE_URL".to_string(), e.to_string())
        })?;
        let secret_key = get_validated_secret("PORTAL_SECRET_KEY")?;
        validate_session_secret(&secret_key, "PORTAL_SECRET_KEY")?;

        let email = EmailConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            secret_key,
            email,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the portal is served over HTTPS (controls `Secure` cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        Url::parse(&self.base_url).is_ok_and(|url| url.scheme() == "https")
    }
}

impl EmailConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(smtp_username), Some(smtp_password), Some(admin_address)) = (
            get_optional_env("MAIL_USERNAME"),
            get_optional_env("MAIL_PASSWORD"),
            get_optional_env("ADMIN_EMAIL"),
        ) else {
            return Ok(None);
        };

        let timeout_secs = parse_env_or_default("MAIL_TIMEOUT_SECS", 10_u64)?;

        Ok(Some(Self {
            smtp_host: get_env_or_default("MAIL_SERVER", "smtp.gmail.com"),
            smtp_port: parse_env_or_default("MAIL_PORT", 587_u16)?,
            from_address: get_optional_env("MAIL_FROM").unwrap_or_else(|| smtp_username.clone()),
            smtp_username,
            smtp_password: SecretString::from(smtp_password),
            admin_address,
            timeout: Duration::from_secs(timeout_secs),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get the database URL, either whole from `DATABASE_URL` or assembled from `DB_*` parts.
///
/// # Errors
///
/// Returns `ConfigError` if neither `DATABASE_URL` nor `DB_PASSWORD` is set,
/// or `DB_PORT` is not a port number.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }

    let parts = DatabaseParts {
        user: get_env_or_default("DB_USER", "portal"),
        password: get_required_env("DB_PASSWORD")?,
        host: get_env_or_default("DB_HOST", "localhost"),
        port: parse_env_or_default("DB_PORT", 5432_u16)?,
        name: get_env_or_default("DB_NAME", "login_db"),
    };
    Ok(SecretString::from(parts.to_url()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
