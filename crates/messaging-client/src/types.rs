//! Messaging types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery channel for a text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Sms,
    #[serde(alias = "WhatsApp")]
    Whatsapp,
}

impl Channel {
    /// Address a phone number for this channel. WhatsApp addresses carry a
    /// `whatsapp:` scheme; SMS addresses are bare E.164 numbers.
    pub fn address(&self, number: &str) -> String {
        match self {
            Channel::Sms => number.to_string(),
            Channel::Whatsapp if number.starts_with("whatsapp:") => number.to_string(),
            Channel::Whatsapp => format!("whatsapp:{}", number),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Sms => f.write_str("sms"),
            Channel::Whatsapp => f.write_str("whatsapp"),
        }
    }
}

/// Provider acknowledgement for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReceipt {
    /// Provider message identifier (Twilio `sid`)
    pub message_id: String,
    /// Provider-reported status, e.g. `queued`
    pub status: Option<String>,
}

/// Message resource returned by Twilio.
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioMessage {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Error body returned by Twilio on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}
