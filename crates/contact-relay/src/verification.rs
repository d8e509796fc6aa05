//! Phone verification flow: issue a code, deliver it, check it.

use crate::error::RelayError;
use chrono::{DateTime, Utc};
use messaging_client::{Channel, MessageSender};
use otp_registry::{OtpCode, OtpRegistry, PhoneKey, PhoneNormalizer};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a successful code delivery.
#[derive(Debug, Clone)]
pub struct CodeSent {
    pub phone_number: PhoneKey,
    pub channel: Channel,
    pub expires_at: DateTime<Utc>,
    pub message_id: String,
}

/// Issues and checks one-time codes for phone numbers.
///
/// A code is only stored once the messaging provider has accepted it, so a
/// failed delivery never leaves behind a code the user cannot know. The
/// registry lock is never held while the provider is being called.
#[derive(Clone)]
pub struct PhoneVerifier {
    registry: OtpRegistry,
    normalizer: PhoneNormalizer,
    sender: Arc<dyn MessageSender>,
    default_channel: Channel,
}

impl PhoneVerifier {
    pub fn new(
        registry: OtpRegistry,
        normalizer: PhoneNormalizer,
        sender: Arc<dyn MessageSender>,
        default_channel: Channel,
    ) -> Self {
        Self {
            registry,
            normalizer,
            sender,
            default_channel,
        }
    }

    pub fn registry(&self) -> &OtpRegistry {
        &self.registry
    }

    /// Normalize a user-supplied phone number.
    pub fn normalize(&self, raw: &str) -> Result<PhoneKey, RelayError> {
        if raw.trim().is_empty() {
            return Err(RelayError::InvalidPhoneNumber(
                "Phone number is required".into(),
            ));
        }
        Ok(self.normalizer.normalize(raw)?)
    }

    /// Generate a code for `raw_phone` and deliver it.
    pub async fn send_code(
        &self,
        raw_phone: &str,
        channel: Option<Channel>,
    ) -> Result<CodeSent, RelayError> {
        let phone_number = self.normalize(raw_phone)?;
        let channel = channel.unwrap_or(self.default_channel);

        let pending = self.registry.prepare(&phone_number);
        let body = otp_message(pending.code(), self.registry.ttl());

        let receipt = match self.sender.send(phone_number.as_str(), channel, &body).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(phone_number = %phone_number, %channel, "Code delivery failed: {}", e);
                return Err(e.into());
            }
        };

        let expires_at = pending.expires_at();
        if !self.registry.commit(pending).await {
            debug!(phone_number = %phone_number, "A newer code was issued while this one was in flight");
        }

        info!(
            phone_number = %phone_number,
            %channel,
            message_id = %receipt.message_id,
            "Verification code sent"
        );

        Ok(CodeSent {
            phone_number,
            channel,
            expires_at,
            message_id: receipt.message_id,
        })
    }

    /// Check a submitted code for `raw_phone`.
    pub async fn check_code(&self, raw_phone: &str, code: &str) -> Result<PhoneKey, RelayError> {
        let phone_number = self.normalize(raw_phone)?;

        if code.trim().is_empty() {
            return Err(RelayError::Validation(vec!["otp".into()]));
        }

        self.registry.verify(&phone_number, code).await?;

        info!(phone_number = %phone_number, "Phone number verified");
        Ok(phone_number)
    }
}

/// Text of the message carrying the code.
pub fn otp_message(code: &OtpCode, ttl: chrono::Duration) -> String {
    format!(
        "Your verification code is {}. It expires in {} minutes.",
        code.as_str(),
        ttl.num_minutes().max(1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use messaging_client::{MessageReceipt, MessagingError};
    use std::sync::Mutex;

    /// Records deliveries; fails every send when `fail` is set.
    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, Channel, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send(
            &self,
            to: &str,
            channel: Channel,
            body: &str,
        ) -> Result<MessageReceipt, MessagingError> {
            if self.fail {
                return Err(MessagingError::Api {
                    status: 500,
                    message: "provider down".into(),
                });
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push((to.to_string(), channel, body.to_string()));
            Ok(MessageReceipt {
                message_id: format!("SM{}", sent.len()),
                status: Some("queued".into()),
            })
        }
    }

    fn verifier(sender: Arc<RecordingSender>) -> PhoneVerifier {
        PhoneVerifier::new(
            OtpRegistry::new(chrono::Duration::minutes(10), 5),
            PhoneNormalizer::default(),
            sender,
            Channel::Sms,
        )
    }

    fn code_from(body: &str) -> String {
        body.chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect()
    }

    #[test]
    fn test_otp_message() {
        let code = OtpCode::generate();
        let text = otp_message(&code, chrono::Duration::minutes(10));
        assert!(text.contains(code.as_str()));
        assert!(text.ends_with("It expires in 10 minutes."));
    }

    #[tokio::test]
    async fn test_send_then_check() {
        let sender = Arc::new(RecordingSender::default());
        let verifier = verifier(sender.clone());

        let sent = verifier.send_code("98765 43210", None).await.unwrap();
        assert_eq!(sent.phone_number.as_str(), "+919876543210");
        assert_eq!(sent.channel, Channel::Sms);
        assert_eq!(sent.message_id, "SM1");

        let (to, channel, body) = sender.sent.lock().unwrap()[0].clone();
        assert_eq!(to, "+919876543210");
        assert_eq!(channel, Channel::Sms);

        let code = code_from(&body);
        assert_eq!(code.len(), 6);

        let verified = verifier.check_code("+919876543210", &code).await.unwrap();
        assert_eq!(verified, sent.phone_number);
        assert!(matches!(
            verifier.check_code("+919876543210", &code).await,
            Err(RelayError::OtpNotFound)
        ));
    }

    #[tokio::test]
    async fn test_explicit_channel() {
        let sender = Arc::new(RecordingSender::default());
        let verifier = verifier(sender.clone());

        let sent = verifier
            .send_code("9876543210", Some(Channel::Whatsapp))
            .await
            .unwrap();
        assert_eq!(sent.channel, Channel::Whatsapp);
        assert_eq!(sender.sent.lock().unwrap()[0].1, Channel::Whatsapp);
    }

    #[tokio::test]
    async fn test_failed_delivery_stores_nothing() {
        let sender = Arc::new(RecordingSender {
            fail: true,
            ..Default::default()
        });
        let verifier = verifier(sender);

        assert!(matches!(
            verifier.send_code("9876543210", None).await,
            Err(RelayError::Messaging(_))
        ));
        assert!(verifier.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_redelivery_keeps_previous_code() {
        let registry = OtpRegistry::new(chrono::Duration::minutes(10), 5);
        let ok_sender = Arc::new(RecordingSender::default());
        let failing = Arc::new(RecordingSender {
            fail: true,
            ..Default::default()
        });

        let first = PhoneVerifier::new(
            registry.clone(),
            PhoneNormalizer::default(),
            ok_sender.clone(),
            Channel::Sms,
        );
        let second = PhoneVerifier::new(
            registry,
            PhoneNormalizer::default(),
            failing,
            Channel::Sms,
        );

        first.send_code("9876543210", None).await.unwrap();
        let code = code_from(&ok_sender.sent.lock().unwrap()[0].2);

        assert!(second.send_code("9876543210", None).await.is_err());
        assert!(first.check_code("9876543210", &code).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_phone_never_reaches_provider() {
        let sender = Arc::new(RecordingSender::default());
        let verifier = verifier(sender.clone());

        assert!(matches!(
            verifier.send_code("12345", None).await,
            Err(RelayError::InvalidPhoneNumber(_))
        ));
        assert!(matches!(
            verifier.send_code("   ", None).await,
            Err(RelayError::InvalidPhoneNumber(_))
        ));
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_code_rejected() {
        let verifier = verifier(Arc::new(RecordingSender::default()));

        assert!(matches!(
            verifier.check_code("9876543210", " ").await,
            Err(RelayError::Validation(_))
        ));
    }
}
