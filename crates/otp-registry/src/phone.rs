//! Phone number normalization.
//!
//! Issuance and verification both go through [`PhoneNormalizer::normalize`],
//! so a number typed differently on the two requests still maps to the
//! same registry key.

use crate::error::OtpError;
use serde::Serialize;
use std::fmt;

/// Default country calling code (India).
pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// Digits in a national number for the default country.
pub const DEFAULT_NATIONAL_LENGTH: usize = 10;

/// A normalized phone number in `+<country code><national number>` form.
///
/// Only [`PhoneNormalizer::normalize`] constructs one, so every key in the
/// registry is non-empty and canonical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PhoneKey(String);

impl PhoneKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PhoneKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps user-supplied phone strings onto [`PhoneKey`]s for one country.
///
/// Accepted shapes, after dropping every non-digit character:
/// - the national number alone (`9876543210`)
/// - the national number behind a trunk `0` (`09876543210`)
/// - the country code followed by the national number, with or without a
///   leading `+` or `00` (`+91 98765 43210`, `919876543210`)
///
/// An explicit `+`/`00` prefix must carry the configured country code.
/// Everything else is rejected with [`OtpError::InvalidPhoneFormat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNormalizer {
    country_code: String,
    national_length: usize,
}

impl Default for PhoneNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTRY_CODE, DEFAULT_NATIONAL_LENGTH)
    }
}

impl PhoneNormalizer {
    /// Create a normalizer. Non-digits in `country_code` (such as a leading
    /// `+`) are ignored.
    pub fn new(country_code: &str, national_length: usize) -> Self {
        Self {
            country_code: country_code.chars().filter(|c| c.is_ascii_digit()).collect(),
            national_length,
        }
    }

    /// Country calling code without the `+`.
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn national_length(&self) -> usize {
        self.national_length
    }

    /// Normalize a raw phone number.
    pub fn normalize(&self, raw: &str) -> Result<PhoneKey, OtpError> {
        let trimmed = raw.trim();
        let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

        if digits.is_empty() {
            return Err(OtpError::InvalidPhoneFormat(
                "Phone number must contain at least one digit".into(),
            ));
        }

        let cc = self.country_code.as_str();
        let n = self.national_length;

        let (international, digits) = if trimmed.starts_with('+') {
            (true, digits.as_str())
        } else if let Some(rest) = digits.strip_prefix("00") {
            (true, rest)
        } else {
            (false, digits.as_str())
        };

        let national = if international {
            digits
                .strip_prefix(cc)
                .filter(|rest| rest.len() == n)
                .ok_or_else(|| {
                    OtpError::InvalidPhoneFormat(format!(
                        "Expected +{} followed by {} digits",
                        cc, n
                    ))
                })?
        } else if digits.len() == n {
            digits
        } else if digits.len() == n + 1 && digits.starts_with('0') {
            &digits[1..]
        } else if digits.len() == cc.len() + n && digits.starts_with(cc) {
            &digits[cc.len()..]
        } else {
            return Err(OtpError::InvalidPhoneFormat(format!(
                "Expected a {}-digit number, optionally prefixed with +{}",
                n, cc
            )));
        };

        Ok(PhoneKey(format!("+{}{}", cc, national)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PhoneKey {
        PhoneKey(s.to_string())
    }

    #[test]
    fn test_normalize_accepted_shapes() {
        let n = PhoneNormalizer::default();

        assert_eq!(n.normalize("9876543210"), Ok(key("+919876543210")));
        assert_eq!(n.normalize("09876543210"), Ok(key("+919876543210")));
        assert_eq!(n.normalize("919876543210"), Ok(key("+919876543210")));
        assert_eq!(n.normalize("+91 98765 43210"), Ok(key("+919876543210")));
        assert_eq!(n.normalize("+91-(987)-654-3210"), Ok(key("+919876543210")));
        assert_eq!(n.normalize("0091 9876543210"), Ok(key("+919876543210")));
        assert_eq!(n.normalize("  +919876543210 "), Ok(key("+919876543210")));
    }

    #[test]
    fn test_normalize_rejections() {
        let n = PhoneNormalizer::default();

        assert!(n.normalize("").is_err());
        assert!(n.normalize("not a number").is_err());
        assert!(n.normalize("12345").is_err());
        assert!(n.normalize("98765432101234").is_err());
        // Explicit foreign country code
        assert!(n.normalize("+14155551234").is_err());
        // Right country code, wrong national length
        assert!(n.normalize("+91987654321").is_err());
    }

    #[test]
    fn test_normalize_other_country() {
        let n = PhoneNormalizer::new("+1", 10);
        assert_eq!(n.country_code(), "1");

        assert_eq!(n.normalize("(415) 555-1234"), Ok(key("+14155551234")));
        assert_eq!(n.normalize("1 415 555 1234"), Ok(key("+14155551234")));
        assert_eq!(n.normalize("+1 415 555 1234"), Ok(key("+14155551234")));
        assert!(n.normalize("+919876543210").is_err());
    }

    #[test]
    fn test_phone_key_serializes_as_string() {
        let json = serde_json::to_string(&key("+919876543210")).unwrap();
        assert_eq!(json, "\"+919876543210\"");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalize_is_idempotent(raw in "[+0-9 ()-]{0,20}") {
                let n = PhoneNormalizer::default();
                if let Ok(first) = n.normalize(&raw) {
                    prop_assert_eq!(n.normalize(first.as_str()), Ok(first.clone()));
                }
            }

            #[test]
            fn formatted_national_numbers_normalize_alike(
                national in "[6-9][0-9]{9}",
                prefix in prop::sample::select(vec!["", "0", "91", "+91", "+91 ", "0091"]),
            ) {
                let n = PhoneNormalizer::default();
                let plain = n.normalize(&national).unwrap();
                let prefixed = n.normalize(&format!("{}{}", prefix, national)).unwrap();
                prop_assert_eq!(plain, prefixed);
            }
        }
    }
}
