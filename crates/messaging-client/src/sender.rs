//! Delivery abstraction used by the OTP flow.

use crate::error::MessagingError;
use crate::types::{Channel, MessageReceipt};
use async_trait::async_trait;

/// Something that can deliver a short text message to a phone number.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Deliver `body` to `to`, returning the provider's message id once the
    /// provider has accepted the message.
    async fn send(
        &self,
        to: &str,
        channel: Channel,
        body: &str,
    ) -> Result<MessageReceipt, MessagingError>;
}
