//! Error types for the contact relay.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mail_client::MailError;
use messaging_client::MessagingError;
use otp_registry::OtpError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Relay error types.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid phone number format: {0}")]
    InvalidPhoneNumber(String),

    #[error("No verification code was requested for this number, or it was already used")]
    OtpNotFound,

    #[error("Verification code has expired, please request a new one")]
    OtpExpired,

    #[error("Incorrect verification code")]
    OtpMismatch { attempts_remaining: u32 },

    #[error("Missing or invalid fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Messaging provider error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("Mail provider error: {0}")]
    Mail(#[from] MailError),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl From<OtpError> for RelayError {
    fn from(e: OtpError) -> Self {
        match e {
            OtpError::InvalidPhoneFormat(msg) => RelayError::InvalidPhoneNumber(msg),
            OtpError::NotFound(_) => RelayError::OtpNotFound,
            OtpError::Expired => RelayError::OtpExpired,
            OtpError::Mismatch { attempts_remaining } => {
                RelayError::OtpMismatch { attempts_remaining }
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl RelayError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            RelayError::InvalidPhoneNumber(_) => (StatusCode::BAD_REQUEST, "INVALID_PHONE_NUMBER"),
            RelayError::OtpNotFound => (StatusCode::BAD_REQUEST, "OTP_NOT_FOUND"),
            RelayError::OtpExpired => (StatusCode::BAD_REQUEST, "OTP_EXPIRED"),
            RelayError::OtpMismatch { .. } => (StatusCode::BAD_REQUEST, "OTP_MISMATCH"),
            RelayError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            RelayError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST_BODY"),
            RelayError::Messaging(e) if e.is_auth_failure() => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PROVIDER_AUTH_FAILED")
            }
            RelayError::Mail(e) if e.is_auth_failure() => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PROVIDER_AUTH_FAILED")
            }
            RelayError::Messaging(_) | RelayError::Mail(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PROVIDER_DELIVERY_FAILED")
            }
            RelayError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
        }
    }

    /// Message shown to the client. Provider details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            RelayError::Messaging(_) => "Failed to send verification code".into(),
            RelayError::Mail(_) => "Failed to send email, but form data was received".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            error!(code, "{}", self);
        }

        let body = ErrorResponse {
            success: false,
            message: self.public_message(),
            code: code.to_string(),
            attempts_remaining: match &self {
                RelayError::OtpMismatch { attempts_remaining } => Some(*attempts_remaining),
                _ => None,
            },
            fields: match self {
                RelayError::Validation(fields) => fields,
                _ => Vec::new(),
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_error_mapping() {
        assert!(matches!(
            RelayError::from(OtpError::NotFound("+919876543210".into())),
            RelayError::OtpNotFound
        ));
        assert!(matches!(
            RelayError::from(OtpError::Expired),
            RelayError::OtpExpired
        ));
        assert!(matches!(
            RelayError::from(OtpError::Mismatch { attempts_remaining: 2 }),
            RelayError::OtpMismatch { attempts_remaining: 2 }
        ));
        assert!(matches!(
            RelayError::from(OtpError::InvalidPhoneFormat("bad".into())),
            RelayError::InvalidPhoneNumber(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RelayError::OtpExpired.status_and_code(),
            (StatusCode::BAD_REQUEST, "OTP_EXPIRED")
        );
        assert_eq!(
            RelayError::Messaging(MessagingError::Unauthorized).status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "PROVIDER_AUTH_FAILED")
        );
        assert_eq!(
            RelayError::Mail(MailError::Api {
                status: 500,
                message: "boom".into()
            })
            .status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "PROVIDER_DELIVERY_FAILED")
        );
        assert_eq!(
            RelayError::InvalidBody("missing field `phone`".into()).status_and_code(),
            (StatusCode::BAD_REQUEST, "INVALID_REQUEST_BODY")
        );
        assert_eq!(
            RelayError::RateLimitExceeded.status_and_code().0,
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_validation_message() {
        let err = RelayError::Validation(vec!["name".into(), "email".into()]);
        assert_eq!(err.to_string(), "Missing or invalid fields: name, email");
    }

    #[test]
    fn test_provider_details_not_exposed() {
        let err = RelayError::Mail(MailError::Api {
            status: 400,
            message: "secret detail".into(),
        });
        assert!(!err.public_message().contains("secret detail"));
    }
}
