//! SendGrid v3 API client.

use crate::error::MailError;
use crate::mailer::Mailer;
use crate::types::*;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default SendGrid API endpoint.
pub const DEFAULT_SENDGRID_URL: &str = "https://api.sendgrid.com";

/// SendGrid client.
///
/// The API key is stored using `SecretString` to prevent accidental
/// exposure in logs or debug output.
#[derive(Clone)]
pub struct SendGridClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl SendGridClient {
    /// Create a new SendGrid client.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: SecretString::new(api_key.into()),
        })
    }

    /// Send a message.
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    pub async fn send_mail(&self, message: &MailMessage) -> Result<MailReceipt, MailError> {
        for mailbox in [&message.from, &message.to] {
            if mailbox.email.trim().is_empty() {
                return Err(MailError::InvalidAddress("address is empty".into()));
            }
        }

        let request = SendGridRequest::from(message);

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.extract_error(response).await);
        }

        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        debug!(message_id = ?message_id, "Mail accepted");

        Ok(MailReceipt { message_id })
    }

    /// Extract error information from failed response.
    async fn extract_error(&self, response: reqwest::Response) -> MailError {
        let status = response.status();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(status = %status, "SendGrid authentication failed");
                MailError::Unauthorized
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<SendGridErrors>(&body)
                    .ok()
                    .filter(|e| !e.errors.is_empty())
                    .map(|e| {
                        e.errors
                            .into_iter()
                            .map(|item| match item.field {
                                Some(field) => format!("{}: {}", field, item.message),
                                None => item.message,
                            })
                            .collect::<Vec<_>>()
                            .join("; ")
                    })
                    .unwrap_or(body);

                warn!(status = %status, message = %message, "SendGrid request failed");
                MailError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}

#[async_trait]
impl Mailer for SendGridClient {
    async fn send(&self, message: &MailMessage) -> Result<MailReceipt, MailError> {
        self.send_mail(message).await
    }
}
