//! Contact Relay - contact form mail relay with phone verification.
//!
//! This service:
//! - Relays contact form submissions to an inbox through the mail provider
//! - Sends one-time codes over SMS or WhatsApp and verifies them
//! - Keeps pending codes in memory only, purging expired ones periodically

pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod verification;

pub use config::Config;
pub use error::RelayError;
pub use form::{ContactForm, ValidatedContact};
pub use verification::{CodeSent, PhoneVerifier};
