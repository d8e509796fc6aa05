//! Messaging client errors.

use crate::types::Channel;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No sender number configured for {0}")]
    NoSender(Channel),
}

impl MessagingError {
    /// True when the provider rejected our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, MessagingError::Unauthorized)
    }
}
