//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use checkout::{DEFAULT_CURRENCY, PollPolicy};
use common::Money;
use gateway::GatewayConfig;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Which payment gateway the server talks to.
#[derive(Debug, Clone)]
pub enum PaymentMode {
    /// The real card gateway.
    Live(GatewayConfig),
    /// An in-memory gateway approving every charge. For local runs only.
    SandboxFake,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` / `PORT`: bind address (default `0.0.0.0:3000`)
/// - `RUST_LOG`: tracing filter directive (default `info`)
/// - `LOG_FORMAT`: `text` or `json` (default `text`)
/// - `API_PREFIX`: route prefix (default `api/v1`; empty or `/` mounts at the root)
/// - `CORS_ORIGIN`: allowed origin (default: any)
/// - `DATABASE_URL`: PostgreSQL URL; the in-memory store is used when unset
/// - `PAYMENT_MODE`: `live` (default) or `sandbox-fake`
/// - `PAYMENT_API_URL`, `PAYMENT_PUBLIC_KEY`, `PAYMENT_PRIVATE_KEY`,
///   `PAYMENT_INTEGRITY_KEY`: required in live mode
/// - `PAYMENT_CURRENCY` (default `COP`)
/// - `BASE_FEE` / `DELIVERY_FEE`: default fees in major units (1000 / 5000)
/// - `PAYMENT_POLL_ATTEMPTS` / `PAYMENT_POLL_DELAY_MS` (4 / 2000)
/// - `SEED_PRODUCTS`: insert demo products into an empty catalog (default `true`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub api_prefix: String,
    pub cors_origin: Option<String>,
    pub database_url: Option<String>,
    pub payment_mode: PaymentMode,
    pub currency: String,
    pub base_fee: Money,
    pub delivery_fee: Money,
    pub poll_policy: PollPolicy,
    pub seed_products: bool,
}

impl Config {
    /// Loads configuration from the process environment, reading a `.env`
    /// file first when one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = Self::default();

        let log_format = match env.get("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(invalid("LOG_FORMAT", format!("unknown format '{other}'"))),
        };

        let payment_mode = match env.get("PAYMENT_MODE").as_deref() {
            None | Some("live") => PaymentMode::Live(GatewayConfig::new(
                env.required("PAYMENT_API_URL")?,
                env.required("PAYMENT_PUBLIC_KEY")?,
                env.required("PAYMENT_PRIVATE_KEY")?,
                env.required("PAYMENT_INTEGRITY_KEY")?,
            )),
            Some("sandbox-fake") => PaymentMode::SandboxFake,
            Some(other) => return Err(invalid("PAYMENT_MODE", format!("unknown mode '{other}'"))),
        };

        let base_fee = env.fee("BASE_FEE", defaults.base_fee)?;
        let delivery_fee = env.fee("DELIVERY_FEE", defaults.delivery_fee)?;

        let poll_policy = PollPolicy::new(
            env.parsed("PAYMENT_POLL_ATTEMPTS", defaults.poll_policy.max_attempts)?,
            Duration::from_millis(env.parsed(
                "PAYMENT_POLL_DELAY_MS",
                defaults.poll_policy.delay.as_millis() as u64,
            )?),
        );

        Ok(Self {
            host: env.get("HOST").unwrap_or(defaults.host),
            port: env.parsed("PORT", defaults.port)?,
            log_level: env.get("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            api_prefix: env
                .raw("API_PREFIX")
                .map(|prefix| normalize_prefix(&prefix))
                .unwrap_or(defaults.api_prefix),
            cors_origin: env.get("CORS_ORIGIN").filter(|origin| origin != "*"),
            database_url: env.get("DATABASE_URL"),
            payment_mode,
            currency: env.get("PAYMENT_CURRENCY").unwrap_or(defaults.currency),
            base_fee,
            delivery_fee,
            poll_policy,
            seed_products: env.parsed("SEED_PRODUCTS", defaults.seed_products)?,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            api_prefix: "/api/v1".to_string(),
            cors_origin: None,
            database_url: None,
            payment_mode: PaymentMode::SandboxFake,
            currency: DEFAULT_CURRENCY.to_string(),
            base_fee: Money::from_major(1000),
            delivery_fee: Money::from_major(5000),
            poll_policy: PollPolicy::default(),
            seed_products: true,
        }
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    /// Like [`Env::raw`], but a blank value counts as unset.
    fn get(&self, key: &str) -> Option<String> {
        self.raw(key).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|err: T::Err| invalid(key, err.to_string())),
        }
    }
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// A non-negative fee in whole major units.
    fn fee(&self, key: &str, default: Money) -> Result<Money, ConfigError> {
        let units: i64 = self.parsed(key, default.major_units())?;
        if units < 0 {
            return Err(invalid(key, "must be non-negative"));
        }
        Money::checked_from_major(units).ok_or_else(|| invalid(key, "is too large"))
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

/// `api/v1/` becomes `/api/v1`; an empty prefix mounts routes at the root.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn live_credentials() -> Vec<(&'static str, &'static str)> {
        vec![
            ("PAYMENT_API_URL", "https://sandbox.example.com/v1"),
            ("PAYMENT_PUBLIC_KEY", "pub_test_key"),
            ("PAYMENT_PRIVATE_KEY", "prv_test_key"),
            ("PAYMENT_INTEGRITY_KEY", "test_integrity"),
        ]
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.api_prefix, "/api/v1");
        assert_eq!(config.currency, "COP");
        assert_eq!(config.base_fee, Money::from_major(1000));
        assert_eq!(config.delivery_fee, Money::from_major(5000));
        assert_eq!(config.poll_policy, PollPolicy::default());
        assert!(config.seed_products);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_live_mode_from_lookup() {
        let mut pairs = live_credentials();
        pairs.extend([("PORT", "8080"), ("BASE_FEE", "1500"), ("LOG_FORMAT", "json")]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.base_fee, Money::from_major(1500));
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.database_url.is_none());
        match config.payment_mode {
            PaymentMode::Live(gateway) => {
                assert_eq!(gateway.base_url, "https://sandbox.example.com/v1");
                assert_eq!(gateway.public_key, "pub_test_key");
            }
            PaymentMode::SandboxFake => panic!("expected live mode"),
        }
    }

    #[test]
    fn test_live_mode_requires_credentials() {
        let err = Config::from_lookup(lookup(&[("PAYMENT_API_URL", "https://x")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingEnvVar("PAYMENT_PUBLIC_KEY".to_string())
        );
    }

    #[test]
    fn test_sandbox_fake_needs_no_credentials() {
        let config = Config::from_lookup(lookup(&[
            ("PAYMENT_MODE", "sandbox-fake"),
            ("PAYMENT_POLL_ATTEMPTS", "2"),
            ("PAYMENT_POLL_DELAY_MS", "10"),
            ("SEED_PRODUCTS", "false"),
        ]))
        .unwrap();

        assert!(matches!(config.payment_mode, PaymentMode::SandboxFake));
        assert_eq!(config.poll_policy.max_attempts, 2);
        assert_eq!(config.poll_policy.delay, Duration::from_millis(10));
        assert!(!config.seed_products);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("PAYMENT_MODE", "sandbox-fake"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "PORT"));
    }

    #[test]
    fn test_negative_fee_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("PAYMENT_MODE", "sandbox-fake"),
            ("DELIVERY_FEE", "-1"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "DELIVERY_FEE"));
    }

    #[test]
    fn test_oversized_fee_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("PAYMENT_MODE", "sandbox-fake"),
            ("BASE_FEE", "100000000000000000"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "BASE_FEE".to_string(),
                message: "is too large".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_prefix_mounts_at_root() {
        let config = Config::from_lookup(lookup(&[
            ("PAYMENT_MODE", "sandbox-fake"),
            ("API_PREFIX", ""),
        ]))
        .unwrap();
        assert_eq!(config.api_prefix, "");

        let config = Config::from_lookup(lookup(&[("PAYMENT_MODE", "sandbox-fake")])).unwrap();
        assert_eq!(config.api_prefix, "/api/v1");
    }

    #[test]
    fn test_prefix_and_cors_normalization() {
        let config = Config::from_lookup(lookup(&[
            ("PAYMENT_MODE", "sandbox-fake"),
            ("API_PREFIX", "/shop/v2/"),
            ("CORS_ORIGIN", "*"),
        ]))
        .unwrap();
        assert_eq!(config.api_prefix, "/shop/v2");
        assert!(config.cors_origin.is_none());

        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix("api/v1"), "/api/v1");
    }
}
