//! # M-Pesa Configuration
//!
//! Configuration management for the Daraja integration.
//! All secrets are loaded from environment variables.

use crate::credentials::basic_credentials;
use chrono::{FixedOffset, Offset, Utc};
use pay_core::{PaymentError, PaymentResult, PhoneFormat};
use std::env;
use std::fmt;
use std::time::Duration;

pub const SANDBOX_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
pub const PRODUCTION_BASE_URL: &str = "https://api.safaricom.co.ke";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// East Africa Time, the clock Daraja validates `Timestamp` against
const DEFAULT_UTC_OFFSET_HOURS: i32 = 3;

/// Which Daraja deployment to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpesaEnvironment {
    Sandbox,
    Production,
}

impl MpesaEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            MpesaEnvironment::Sandbox => SANDBOX_BASE_URL,
            MpesaEnvironment::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl std::str::FromStr for MpesaEnvironment {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(MpesaEnvironment::Sandbox),
            "production" | "live" => Ok(MpesaEnvironment::Production),
            other => Err(PaymentError::Configuration(format!(
                "MPESA_ENVIRONMENT must be sandbox or production, got {}",
                other
            ))),
        }
    }
}

/// Daraja API configuration
#[derive(Clone)]
pub struct MpesaConfig {
    /// App consumer key
    pub consumer_key: String,

    /// App consumer secret
    pub consumer_secret: String,

    /// Paybill / till number the payment is credited to
    pub short_code: String,

    /// Lipa Na M-Pesa Online passkey
    pub passkey: String,

    /// Where Daraja posts the asynchronous payment result
    pub callback_url: String,

    pub environment: MpesaEnvironment,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// Ceiling applied to connect and to each whole request
    pub timeout: Duration,

    /// Offset used to render the request `Timestamp`
    pub utc_offset: FixedOffset,

    pub phone_format: PhoneFormat,
}

impl MpesaConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `MPESA_CONSUMER_KEY`
    /// - `MPESA_CONSUMER_SECRET`
    /// - `MPESA_SHORT_CODE`
    /// - `MPESA_PASSKEY`
    /// - `MPESA_CALLBACK_URL`
    ///
    /// Optional: `MPESA_ENVIRONMENT`, `MPESA_API_BASE_URL`,
    /// `MPESA_TIMEOUT_SECS`, `MPESA_UTC_OFFSET_HOURS`.
    pub fn from_env() -> PaymentResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let consumer_key = required("MPESA_CONSUMER_KEY")?;
        let consumer_secret = required("MPESA_CONSUMER_SECRET")?;
        let short_code = required("MPESA_SHORT_CODE")?;
        let passkey = required("MPESA_PASSKEY")?;
        let callback_url = required("MPESA_CALLBACK_URL")?;

        if !short_code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PaymentError::Configuration(
                "MPESA_SHORT_CODE must be numeric".to_string(),
            ));
        }

        if !callback_url.starts_with("https://") && !callback_url.starts_with("http://") {
            return Err(PaymentError::Configuration(
                "MPESA_CALLBACK_URL must be an http(s) URL".to_string(),
            ));
        }

        let environment = match env::var("MPESA_ENVIRONMENT") {
            Ok(value) => value.parse()?,
            Err(_) => MpesaEnvironment::Sandbox,
        };

        let mut config = Self::new(consumer_key, consumer_secret, short_code, passkey, callback_url)
            .with_environment(environment);

        if let Ok(url) = env::var("MPESA_API_BASE_URL") {
            config = config.with_api_base_url(url);
        }

        if let Ok(secs) = env::var("MPESA_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                PaymentError::Configuration("MPESA_TIMEOUT_SECS must be an integer".to_string())
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Ok(hours) = env::var("MPESA_UTC_OFFSET_HOURS") {
            let hours: i32 = hours.parse().map_err(|_| {
                PaymentError::Configuration(
                    "MPESA_UTC_OFFSET_HOURS must be an integer".to_string(),
                )
            })?;
            config.utc_offset = offset_hours(hours)?;
        }

        Ok(config)
    }

    /// Create config with explicit values (for testing)
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        short_code: impl Into<String>,
        passkey: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            short_code: short_code.into(),
            passkey: passkey.into(),
            callback_url: callback_url.into(),
            environment: MpesaEnvironment::Sandbox,
            api_base_url: SANDBOX_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            utc_offset: offset_hours(DEFAULT_UTC_OFFSET_HOURS).unwrap_or_else(|_| Utc.fix()),
            phone_format: PhoneFormat::kenya(),
        }
    }

    /// Check if talking to the sandbox
    pub fn is_sandbox(&self) -> bool {
        self.environment == MpesaEnvironment::Sandbox
    }

    /// Get the OAuth authorization header value
    pub fn basic_auth_header(&self) -> String {
        format!(
            "Basic {}",
            basic_credentials(&self.consumer_key, &self.consumer_secret)
        )
    }

    pub fn token_url(&self) -> String {
        format!(
            "{}/oauth/v1/generate?grant_type=client_credentials",
            self.api_base_url
        )
    }

    pub fn stk_push_url(&self) -> String {
        format!("{}/mpesa/stkpush/v1/processrequest", self.api_base_url)
    }

    /// Builder: pick deployment (also resets the base URL)
    pub fn with_environment(mut self, environment: MpesaEnvironment) -> Self {
        self.environment = environment;
        self.api_base_url = environment.base_url().to_string();
        self
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder: set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// Secrets never reach logs through `{:?}`
impl fmt::Debug for MpesaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpesaConfig")
            .field("consumer_key", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .field("short_code", &self.short_code)
            .field("passkey", &"<redacted>")
            .field("callback_url", &self.callback_url)
            .field("environment", &self.environment)
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .field("utc_offset", &self.utc_offset)
            .finish()
    }
}

fn required(name: &str) -> PaymentResult<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(PaymentError::Configuration(format!("{} not set", name))),
    }
}

fn offset_hours(hours: i32) -> PaymentResult<FixedOffset> {
    FixedOffset::east_opt(hours * 3600).ok_or_else(|| {
        PaymentError::Configuration(format!("UTC offset out of range: {} hours", hours))
    })
}
