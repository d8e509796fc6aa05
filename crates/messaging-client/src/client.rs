//! Twilio Messages API client.

use crate::error::MessagingError;
use crate::sender::MessageSender;
use crate::types::*;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default Twilio REST API endpoint.
pub const DEFAULT_TWILIO_URL: &str = "https://api.twilio.com";

/// Settings for [`TwilioClient`].
#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number for SMS
    pub sms_from: Option<String>,
    /// Sender number for WhatsApp, with or without the `whatsapp:` scheme
    pub whatsapp_from: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

/// Twilio client for outbound SMS and WhatsApp messages.
///
/// The auth token is stored using `SecretString` to prevent accidental
/// exposure in logs or debug output.
#[derive(Clone)]
pub struct TwilioClient {
    client: Client,
    base_url: String,
    account_sid: String,
    auth_token: SecretString,
    sms_from: Option<String>,
    whatsapp_from: Option<String>,
}

impl TwilioClient {
    /// Create a new Twilio client.
    pub fn new(options: TwilioOptions) -> Result<Self, MessagingError> {
        let client = Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            account_sid: options.account_sid,
            auth_token: SecretString::new(options.auth_token),
            sms_from: options.sms_from.filter(|s| !s.is_empty()),
            whatsapp_from: options.whatsapp_from.filter(|s| !s.is_empty()),
        })
    }

    fn sender_for(&self, channel: Channel) -> Result<&str, MessagingError> {
        match channel {
            Channel::Sms => self.sms_from.as_deref(),
            Channel::Whatsapp => self.whatsapp_from.as_deref(),
        }
        .ok_or(MessagingError::NoSender(channel))
    }

    /// Send a text message to `to` over `channel`.
    #[instrument(skip(self, body))]
    pub async fn send_message(
        &self,
        to: &str,
        channel: Channel,
        body: &str,
    ) -> Result<MessageReceipt, MessagingError> {
        let from = channel.address(self.sender_for(channel)?);
        let to = channel.address(to);

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        debug!(url = %url, "Sending message request");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&[("To", to.as_str()), ("From", from.as_str()), ("Body", body)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.extract_error(response).await);
        }

        let message: TwilioMessage = serde_json::from_str(&response.text().await?)?;
        debug!(sid = %message.sid, "Message accepted");

        Ok(MessageReceipt {
            message_id: message.sid,
            status: message.status,
        })
    }

    /// Extract error information from failed response.
    async fn extract_error(&self, response: reqwest::Response) -> MessagingError {
        let status = response.status();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(status = %status, "Twilio authentication failed");
                MessagingError::Unauthorized
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<TwilioErrorBody>(&body)
                    .map(|e| match e.code {
                        Some(code) => format!("{} (code {})", e.message, code),
                        None => e.message,
                    })
                    .unwrap_or(body);

                warn!(status = %status, message = %message, "Twilio request failed");
                MessagingError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}

#[async_trait]
impl MessageSender for TwilioClient {
    async fn send(
        &self,
        to: &str,
        channel: Channel,
        body: &str,
    ) -> Result<MessageReceipt, MessagingError> {
        self.send_message(to, channel, body).await
    }
}
