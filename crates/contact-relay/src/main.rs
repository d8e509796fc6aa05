//! Contact Relay - Entry point.

use anyhow::{Context, Result};
use contact_relay::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    config::Config,
    PhoneVerifier,
};
use mail_client::{Mailbox, SendGridClient};
use messaging_client::{TwilioClient, TwilioOptions};
use otp_registry::{spawn_sweeper, OtpRegistry, PhoneNormalizer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.log.level);

    info!("Starting Contact Relay");

    // Messaging provider
    if config.twilio.account_sid.is_empty() {
        warn!("TWILIO__ACCOUNT_SID is not set, code delivery will fail");
    }
    let twilio = TwilioClient::new(TwilioOptions {
        account_sid: config.twilio.account_sid.clone(),
        auth_token: config.twilio.auth_token.clone(),
        sms_from: config.twilio.sms_from.clone(),
        whatsapp_from: config.twilio.whatsapp_from.clone(),
        base_url: config.twilio.base_url.clone(),
        timeout: config.twilio.timeout,
    })
    .context("Failed to create Twilio client")?;

    // Mail provider
    if config.mail.api_key.is_empty() || config.mail.from_address.is_empty() {
        warn!("Mail provider is not fully configured, form submissions will fail");
    }
    let sendgrid = SendGridClient::new(
        config.mail.api_key.clone(),
        config.mail.base_url.clone(),
        config.mail.timeout,
    )
    .context("Failed to create SendGrid client")?;

    // OTP registry and its sweeper
    let ttl = chrono::Duration::from_std(config.otp.ttl).context("OTP ttl out of range")?;
    let registry = OtpRegistry::new(ttl, config.otp.max_attempts);
    let sweeper = spawn_sweeper(registry.clone(), config.otp.sweep_interval);

    let normalizer = PhoneNormalizer::new(&config.otp.country_code, config.otp.national_length);
    info!(
        "OTP registry ready (ttl={:?}, max_attempts={}, country_code=+{})",
        config.otp.ttl,
        registry.max_attempts(),
        normalizer.country_code()
    );

    let verifier = PhoneVerifier::new(
        registry,
        normalizer,
        Arc::new(twilio),
        config.otp.default_channel,
    );

    // Create application state
    let state = AppState::new(
        verifier,
        Arc::new(sendgrid),
        Mailbox::named(config.mail.from_name.clone(), config.mail.from_address.clone()),
        Mailbox::new(config.mail.inbox_address()),
    );

    // Create router with rate limiting
    let rate_limit = RateLimitState::new(config.rate_limit.otp_per_minute);
    let app = create_router_with_rate_limit(state, rate_limit);

    // Bind to address
    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address: {}", config.server.listen_addr))?,
        config.server.port,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);
    info!("Health check: http://{}/", addr);

    // Run server
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    sweeper.abort();
    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
