//! Mail client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

impl MailError {
    /// True when the provider rejected our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, MailError::Unauthorized)
    }
}
