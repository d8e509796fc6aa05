//! Outbound email delivery.

mod client;
mod error;
mod mailer;
mod types;

pub use client::{SendGridClient, DEFAULT_SENDGRID_URL};
pub use error::MailError;
pub use mailer::Mailer;
pub use types::*;
