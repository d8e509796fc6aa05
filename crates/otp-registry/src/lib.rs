//! One-time code registry for phone number verification.
//!
//! Codes are held in process memory only, keyed by a normalized phone
//! number. A restart discards every outstanding challenge.

mod error;
mod phone;
mod registry;
mod sweeper;
mod types;

pub use error::OtpError;
pub use phone::{PhoneKey, PhoneNormalizer, DEFAULT_COUNTRY_CODE, DEFAULT_NATIONAL_LENGTH};
pub use registry::OtpRegistry;
pub use sweeper::{spawn_sweeper, Sweeper, MIN_SWEEP_INTERVAL};
pub use types::*;
