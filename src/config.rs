use crate::{
    middleware::ApiCredentials,
    models::{SignedFieldNames, SIGNED_FIELD_NAMES},
    services::{
        gateway::{PRODUCTION_GATEWAY_URL, TEST_GATEWAY_URL},
        payment_form::DEFAULT_SIGNED_FIELD_NAMES,
        PaymentDefaults, TransactionIdStrategy,
    },
};
use anyhow::{anyhow, bail, Context, Result};
use std::fmt;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn default_gateway_url(&self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_GATEWAY_URL,
            Environment::Development | Environment::Test => TEST_GATEWAY_URL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

/// Secret value that is wiped on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    inner: String,
}

impl SecretString {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            inner: secret.into(),
        }
    }

    pub fn expose_secret(&self) -> &str {
        &self.inner
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    /// Proxy-supplied header holding the real client IP.
    pub client_ip_header: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Merchant credentials
    pub access_key: String,
    pub profile_id: String,
    pub secret_key: SecretString,

    // Gateway
    pub gateway_url: String,
    pub gateway_timeout: Duration,
    pub checkout_url: Option<String>,

    // Inbound authorization for the redirect route
    pub api_credentials: Option<ApiCredentials>,

    // Form contents
    pub payment_defaults: PaymentDefaults,
    pub signed_field_names: SignedFieldNames,
    pub transaction_id_strategy: TransactionIdStrategy,

    // Rate Limiting
    pub rate_limit: RateLimitConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let required = |key: &str| var(key).with_context(|| format!("{} required", key));

        let environment = Self::parse_environment(var("ENVIRONMENT"))?;
        let defaults = PaymentDefaults::default();

        let api_credentials = match (var("API_KEY"), var("API_SECRET")) {
            (Some(key), Some(secret)) => Some(ApiCredentials::new(key, secret)),
            (None, None) => None,
            _ => bail!("API_KEY and API_SECRET must be set together"),
        };

        let secret_key = var("SECRET_KEY")
            .or_else(|| var("SIGNATURE"))
            .ok_or_else(|| anyhow!("SECRET_KEY required"))?;

        let config = Self {
            gateway_url: var("GATEWAY_URL")
                .unwrap_or_else(|| environment.default_gateway_url().to_string()),
            environment,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("Invalid PORT")?,

            access_key: required("ACCESS_KEY")?,
            profile_id: required("PROFILE_ID")?,
            secret_key: SecretString::new(secret_key),

            gateway_timeout: Duration::from_secs(
                var("GATEWAY_TIMEOUT_SECS")
                    .unwrap_or_else(|| "15".to_string())
                    .parse()
                    .context("Invalid GATEWAY_TIMEOUT_SECS")?,
            ),
            checkout_url: var("CHECKOUT_URL"),

            api_credentials,

            payment_defaults: PaymentDefaults {
                locale: var("LOCALE").unwrap_or(defaults.locale),
                transaction_type: var("TRANSACTION_TYPE").unwrap_or(defaults.transaction_type),
                currency: var("CURRENCY").unwrap_or(defaults.currency),
                bill_to_address_country: var("BILL_TO_ADDRESS_COUNTRY")
                    .unwrap_or(defaults.bill_to_address_country),
            },
            signed_field_names: var("SIGNED_FIELD_NAMES")
                .as_deref()
                .unwrap_or(DEFAULT_SIGNED_FIELD_NAMES)
                .parse()
                .context("Invalid SIGNED_FIELD_NAMES")?,
            transaction_id_strategy: var("TRANSACTION_ID_STRATEGY")
                .as_deref()
                .unwrap_or("random")
                .parse()
                .map_err(|e: String| anyhow!(e))?,

            rate_limit: RateLimitConfig {
                max_requests: var("RATE_LIMIT_MAX")
                    .unwrap_or_else(|| "10".to_string())
                    .parse()
                    .context("Invalid RATE_LIMIT_MAX")?,
                window: Duration::from_secs(
                    var("RATE_LIMIT_WINDOW_SECS")
                        .unwrap_or_else(|| "86400".to_string())
                        .parse()
                        .context("Invalid RATE_LIMIT_WINDOW_SECS")?,
                ),
                client_ip_header: var("CLIENT_IP_HEADER")
                    .unwrap_or_else(|| "fastly-client-ip".to_string())
                    .to_lowercase(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment(value: Option<String>) -> Result<Environment> {
        let env = value.unwrap_or_else(|| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" | "testing" | "staging" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.gateway_url.starts_with("http") {
            bail!("GATEWAY_URL must be HTTP(S) URL");
        }
        if let Some(url) = &self.checkout_url {
            if !url.starts_with("http") {
                bail!("CHECKOUT_URL must be HTTP(S) URL");
            }
        }
        if !self.signed_field_names.contains(SIGNED_FIELD_NAMES) {
            bail!("SIGNED_FIELD_NAMES must include signed_field_names");
        }
        if self.gateway_timeout.is_zero() {
            bail!("GATEWAY_TIMEOUT_SECS must be greater than zero");
        }
        if self.rate_limit.max_requests == 0 || self.rate_limit.window.is_zero() {
            bail!("RATE_LIMIT_MAX and RATE_LIMIT_WINDOW_SECS must be greater than zero");
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }
}
