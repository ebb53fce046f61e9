//! Market service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MARKET_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `MARKET_BASE_URL` - Public URL of the service
//! - `MARKET_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `MARKET_HOST` - Bind address (default: 127.0.0.1)
//! - `MARKET_PORT` - Listen port (default: 3000)
//! - `MARKET_CONTENT_DIR` - Markdown content root (default: `crates/market/content`)
//! - `MARKET_OFFER_FLOOR` - Lowest price a buyer may offer, in FCFA (default: 500)
//! - `MARKET_COMMISSION_RATE` - Platform commission on vendor sales (default: 0.10)
//! - `MARKET_PAYOUT_WINDOW_DAYS` - Days after delivery before payout release (default: 3)
//! - `SMTP_HOST` - SMTP relay; notification email is disabled when unset
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM_ADDRESS` - required when `SMTP_HOST` is set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::TimeDelta;
use mayombe_core::Money;
use mayombe_core::negotiation::OfferPolicy;
use mayombe_core::payout::PayoutPolicy;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Longest accepted payout confirmation window.
pub const MAX_PAYOUT_WINDOW_DAYS: u32 = 365;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "motdepasse",
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

/// Market service configuration.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Directory holding `pages/*.md`
    pub content_dir: PathBuf,
    /// Marketplace business rules
    pub rules: MarketRules,
    /// Outbound notification email, if configured
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Tunable marketplace rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketRules {
    /// Lowest acceptable negotiated price.
    pub offer_floor: Money,
    /// Platform commission ratio in `[0, 1]`.
    pub commission_rate: Decimal,
    /// Days between delivery and payout release.
    pub payout_window_days: u32,
}

impl Default for MarketRules {
    fn default() -> Self {
        Self {
            offer_floor: Money::francs(500),
            commission_rate: Decimal::new(10, 2),
            payout_window_days: 3,
        }
    }
}

impl MarketRules {
    /// Negotiation bounds derived from these rules.
    #[must_use]
    pub const fn offer_policy(&self) -> OfferPolicy {
        OfferPolicy {
            floor: self.offer_floor,
        }
    }

    /// Payout settings derived from these rules.
    #[must_use]
    pub fn payout_policy(&self) -> PayoutPolicy {
        PayoutPolicy {
            commission_rate: self.commission_rate,
            window: TimeDelta::days(i64::from(self.payout_window_days)),
        }
    }
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Sender address for notifications
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl MarketConfig {
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

        let database_url = get_database_url("MARKET_DATABASE_URL")?;
        let host = parse_env("MARKET_HOST", "127.0.0.1")?;
        let port = parse_env("MARKET_PORT", "3000")?;
        let base_url = get_required_env("MARKET_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("MARKET_BASE_URL".to_string(), e.to_string())
        })?;
        let session_secret = get_validated_secret("MARKET_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "MARKET_SESSION_SECRET")?;
        let content_dir =
            PathBuf::from(get_env_or_default("MARKET_CONTENT_DIR", "crates/market/content"));

        let rules = MarketRules::from_env()?;
        let email = EmailConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            content_dir,
            rules,
            email,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl MarketRules {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let offer_floor = match get_optional_env("MARKET_OFFER_FLOOR") {
            Some(raw) => parse_money("MARKET_OFFER_FLOOR", &raw)?,
            None => defaults.offer_floor,
        };
        let commission_rate = match get_optional_env("MARKET_COMMISSION_RATE") {
            Some(raw) => parse_ratio("MARKET_COMMISSION_RATE", &raw)?,
            None => defaults.commission_rate,
        };
        let payout_window_days = parse_window_days(
            "MARKET_PAYOUT_WINDOW_DAYS",
            &get_env_or_default("MARKET_PAYOUT_WINDOW_DAYS", "3"),
        )?;

        Ok(Self {
            offer_floor,
            commission_rate,
            payout_window_days,
        })
    }
}

impl EmailConfig {
    /// Email is optional: without `SMTP_HOST` notifications are skipped.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };

        Ok(Some(Self {
            smtp_host,
            smtp_port: parse_env("SMTP_PORT", "587")?,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_validated_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("SMTP_FROM_ADDRESS")?,
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

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_money(key: &str, raw: &str) -> Result<Money, ConfigError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| e.to_string())
        .and_then(|d| Money::new(d).map_err(|e| e.to_string()))
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
}

fn parse_ratio(key: &str, raw: &str) -> Result<Decimal, ConfigError> {
    let ratio = raw
        .trim()
        .parse::<Decimal>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if ratio < Decimal::ZERO || ratio > Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0 and 1".to_string(),
        ));
    }
    Ok(ratio)
}

fn parse_window_days(key: &str, raw: &str) -> Result<u32, ConfigError> {
    let days = raw
        .trim()
        .parse::<u32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if days > MAX_PAYOUT_WINDOW_DAYS {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be at most {MAX_PAYOUT_WINDOW_DAYS}"),
        ));
    }
    Ok(days)
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
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> MarketConfig {
        MarketConfig {
            database_url: SecretString::from("postgres://localhost/mayombe_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            content_dir: PathBuf::from("content"),
            rules: MarketRules::default(),
            email: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-session-key-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let err = validate_secret_strength(&"a".repeat(33), "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_session_secret_length() {
        assert!(validate_session_secret(&SecretString::from("short"), "S").is_err());
        assert!(validate_session_secret(&SecretString::from("a".repeat(32)), "S").is_ok());
    }

    #[test]
    fn test_socket_addr_and_https() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_https());
    }

    #[test]
    fn test_parse_money_and_ratio() {
        assert_eq!(parse_money("K", "750").unwrap(), Money::francs(750));
        assert!(parse_money("K", "-1").is_err());
        assert!(parse_money("K", "abc").is_err());

        assert_eq!(parse_ratio("K", "0.15").unwrap(), Decimal::new(15, 2));
        assert!(parse_ratio("K", "1.5").is_err());
        assert!(parse_ratio("K", "-0.1").is_err());
    }

    #[test]
    fn test_rules_policies() {
        let rules = MarketRules::default();
        assert_eq!(rules.offer_policy().floor, Money::francs(500));
        assert_eq!(rules.payout_policy().window, TimeDelta::days(3));
        assert_eq!(rules.payout_policy().commission_rate, Decimal::new(10, 2));
    }

    #[test]
    fn test_payout_window_days_bounds() {
        assert_eq!(parse_window_days("W", " 7 ").unwrap(), 7);
        assert_eq!(
            parse_window_days("W", "365").unwrap(),
            MAX_PAYOUT_WINDOW_DAYS
        );
        assert!(matches!(
            parse_window_days("W", "4000000000"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_window_days("W", "-1").is_err());
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let config = EmailConfig {
            smtp_host: "smtp.mayombe-market.cg".to_string(),
            smtp_port: 587,
            smtp_username: "notifications".to_string(),
            smtp_password: SecretString::from("super_secret_smtp_value"),
            from_address: "Mayombe Market <noreply@mayombe-market.cg>".to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("smtp.mayombe-market.cg"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_smtp_value"));
    }
}
