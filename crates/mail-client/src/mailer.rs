//! Mail delivery abstraction used by the contact form.

use crate::error::MailError;
use crate::types::{MailMessage, MailReceipt};
use async_trait::async_trait;

/// Something that can deliver an email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<MailReceipt, MailError>;
}
