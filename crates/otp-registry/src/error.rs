//! OTP registry errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("Invalid phone number format: {0}")]
    InvalidPhoneFormat(String),

    #[error("No pending verification code for {0}")]
    NotFound(String),

    #[error("Verification code expired")]
    Expired,

    #[error("Verification code does not match ({attempts_remaining} attempts remaining)")]
    Mismatch { attempts_remaining: u32 },
}
