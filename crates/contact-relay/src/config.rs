//! Configuration for the contact relay.

use anyhow::{bail, Context, Result};
use mail_client::DEFAULT_SENDGRID_URL;
use messaging_client::{Channel, DEFAULT_TWILIO_URL};
use otp_registry::{DEFAULT_COUNTRY_CODE, DEFAULT_NATIONAL_LENGTH};
use serde::Deserialize;
use std::time::Duration;

/// Relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// One-time code configuration
    #[serde(default)]
    pub otp: OtpConfig,

    /// Twilio messaging configuration
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// Mail provider configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    /// How long an issued code stays valid
    #[serde(default = "default_otp_ttl", with = "humantime_serde")]
    pub ttl: Duration,

    /// How often expired codes are purged
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,

    /// Wrong codes tolerated before a code is discarded
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Country calling code prepended to national numbers
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Digits in a national number
    #[serde(default = "default_national_length")]
    pub national_length: usize,

    /// Channel used when a request does not name one
    #[serde(default)]
    pub default_channel: Channel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: String,

    #[serde(default)]
    pub auth_token: String,

    /// Sender number for SMS
    #[serde(default)]
    pub sms_from: Option<String>,

    /// Sender number for WhatsApp
    #[serde(default)]
    pub whatsapp_from: Option<String>,

    /// Twilio API base URL
    #[serde(default = "default_twilio_url")]
    pub base_url: String,

    /// Request timeout
    #[serde(default = "default_provider_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// SendGrid API key
    #[serde(default)]
    pub api_key: String,

    /// Sender address for relayed submissions
    #[serde(default)]
    pub from_address: String,

    /// Sender display name
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Where submissions are delivered (defaults to the sender address)
    #[serde(default)]
    pub inbox: Option<String>,

    /// SendGrid API base URL
    #[serde(default = "default_sendgrid_url")]
    pub base_url: String,

    /// Request timeout
    #[serde(default = "default_provider_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl MailConfig {
    /// Delivery address for submissions.
    pub fn inbox_address(&self) -> &str {
        self.inbox
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.from_address)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Requests per minute across the OTP endpoints
    #[serde(default = "default_otp_rpm")]
    pub otp_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl: default_otp_ttl(),
            sweep_interval: default_sweep_interval(),
            max_attempts: default_max_attempts(),
            country_code: default_country_code(),
            national_length: default_national_length(),
            default_channel: Channel::default(),
        }
    }
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            sms_from: None,
            whatsapp_from: None,
            base_url: default_twilio_url(),
            timeout: default_provider_timeout(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            from_address: String::new(),
            from_name: default_from_name(),
            inbox: None,
            base_url: default_sendgrid_url(),
            timeout: default_provider_timeout(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            otp_per_minute: default_otp_rpm(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    5000
}

fn default_otp_ttl() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_max_attempts() -> u32 {
    5
}

fn default_country_code() -> String {
    DEFAULT_COUNTRY_CODE.into()
}

fn default_national_length() -> usize {
    DEFAULT_NATIONAL_LENGTH
}

fn default_twilio_url() -> String {
    DEFAULT_TWILIO_URL.into()
}

fn default_sendgrid_url() -> String {
    DEFAULT_SENDGRID_URL.into()
}

fn default_provider_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_from_name() -> String {
    "JP Services Contact Form".into()
}

fn default_otp_rpm() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Nested keys use `__` as separator (`OTP__TTL=10m`,
    /// `TWILIO__ACCOUNT_SID=...`). A plain `PORT` variable, as set by most
    /// hosting platforms, overrides `SERVER__PORT`.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.otp.ttl.is_zero() {
            bail!("OTP__TTL must be greater than zero");
        }
        if self.otp.sweep_interval.is_zero() {
            bail!("OTP__SWEEP_INTERVAL must be greater than zero");
        }
        if self.otp.national_length == 0 {
            bail!("OTP__NATIONAL_LENGTH must be greater than zero");
        }
        Ok(())
    }
}
