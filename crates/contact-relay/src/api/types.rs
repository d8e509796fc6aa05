//! API request and response types.

use messaging_client::Channel;
use serde::{Deserialize, Serialize};

/// Request to send a one-time code.
#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub phone: String,

    /// Delivery channel; the configured default when absent
    #[serde(default)]
    pub method: Option<Channel>,
}

/// Response after sending a code.
#[derive(Debug, Serialize)]
pub struct SendOtpResponse {
    pub success: bool,
    pub message: String,
    pub phone: String,
    pub channel: Channel,
    pub expires_at: String,
}

/// Request to verify a one-time code.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub otp: String,
}

/// Response after verification.
#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub message: String,
    pub phone: String,
}

/// Response after a form submission was relayed.
#[derive(Debug, Serialize)]
pub struct SubmitFormResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "emailId", skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,
}

/// Service banner returned from `/`.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub status: String,
    pub timestamp: String,
    pub endpoints: Endpoints,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    pub submit_form: String,
    pub send_otp: String,
    pub verify_otp: String,
    pub keep_alive: String,
}

/// Keep-alive response.
#[derive(Debug, Serialize)]
pub struct KeepAliveResponse {
    pub status: String,
    pub timestamp: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub pending_otps: usize,
}
