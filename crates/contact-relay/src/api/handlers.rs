//! HTTP request handlers.

use super::types::{
    Endpoints, HealthResponse, IndexResponse, KeepAliveResponse, SendOtpRequest,
    SendOtpResponse, SubmitFormResponse, VerifyOtpRequest, VerifyOtpResponse,
};
use super::extract::RelayJson;
use super::AppState;
use crate::error::RelayError;
use crate::form::ContactForm;
use axum::{extract::State, Json};
use chrono::Utc;
use tracing::{debug, info};

/// Service banner.
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        status: "Server is running".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        endpoints: Endpoints {
            submit_form: "POST /submit-form".to_string(),
            send_otp: "POST /send-otp".to_string(),
            verify_otp: "POST /verify-otp".to_string(),
            keep_alive: "GET /keep-alive".to_string(),
        },
    })
}

/// Liveness endpoint for hosting platforms that idle quiet processes.
pub async fn keep_alive() -> Json<KeepAliveResponse> {
    debug!("Keep-alive endpoint hit");

    Json(KeepAliveResponse {
        status: "alive".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        pending_otps: state.verifier.registry().len().await,
    })
}

/// Send a one-time code to a phone number.
pub async fn send_otp(
    State(state): State<AppState>,
    RelayJson(request): RelayJson<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, RelayError> {
    let sent = state
        .verifier
        .send_code(&request.phone, request.method)
        .await?;

    Ok(Json(SendOtpResponse {
        success: true,
        message: format!("OTP sent successfully via {}", sent.channel),
        phone: sent.phone_number.to_string(),
        channel: sent.channel,
        expires_at: sent.expires_at.to_rfc3339(),
    }))
}

/// Verify a one-time code.
pub async fn verify_otp(
    State(state): State<AppState>,
    RelayJson(request): RelayJson<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, RelayError> {
    let phone = state
        .verifier
        .check_code(&request.phone, &request.otp)
        .await?;

    Ok(Json(VerifyOtpResponse {
        success: true,
        message: "Phone number verified successfully".to_string(),
        phone: phone.to_string(),
    }))
}

/// Relay a contact form submission to the inbox.
pub async fn submit_form(
    State(state): State<AppState>,
    RelayJson(form): RelayJson<ContactForm>,
) -> Result<Json<SubmitFormResponse>, RelayError> {
    let contact = form.validate()?;
    info!(service = %contact.service, "Form submission received");

    let mail = contact.to_mail(&state.mail_from, &state.inbox);
    let receipt = state.mailer.send(&mail).await?;

    info!(message_id = ?receipt.message_id, "Form submission relayed");

    Ok(Json(SubmitFormResponse {
        success: true,
        message: "Form submitted successfully".to_string(),
        email_id: receipt.message_id,
    }))
}
