//! Mail types and SendGrid wire format.

use serde::{Deserialize, Serialize};

/// An email address with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Mailbox {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn named(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }
}

/// A message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: Mailbox,
    pub to: Mailbox,
    pub reply_to: Option<Mailbox>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Provider acknowledgement for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailReceipt {
    /// Provider message id, when the provider reports one
    pub message_id: Option<String>,
}

/// SendGrid `POST /v3/mail/send` request body.
#[derive(Debug, Serialize)]
pub struct SendGridRequest<'a> {
    pub personalizations: Vec<Personalization<'a>>,
    pub from: &'a Mailbox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<&'a Mailbox>,
    pub subject: &'a str,
    pub content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Personalization<'a> {
    pub to: Vec<&'a Mailbox>,
}

#[derive(Debug, Serialize)]
pub struct Content<'a> {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub value: &'a str,
}

impl<'a> From<&'a MailMessage> for SendGridRequest<'a> {
    fn from(message: &'a MailMessage) -> Self {
        Self {
            personalizations: vec![Personalization {
                to: vec![&message.to],
            }],
            from: &message.from,
            reply_to: message.reply_to.as_ref(),
            subject: &message.subject,
            content: vec![
                Content {
                    content_type: "text/plain",
                    value: &message.text,
                },
                Content {
                    content_type: "text/html",
                    value: &message.html,
                },
            ],
        }
    }
}

/// Error body returned by SendGrid on failure.
#[derive(Debug, Deserialize)]
pub struct SendGridErrors {
    #[serde(default)]
    pub errors: Vec<SendGridErrorItem>,
}

#[derive(Debug, Deserialize)]
pub struct SendGridErrorItem {
    pub message: String,
    #[serde(default)]
    pub field: Option<String>,
}
