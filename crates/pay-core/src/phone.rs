//! # Phone Number Normalization
//!
//! M-Pesa identifies payers by MSISDN in international digit form without the
//! leading `+` (e.g. `254712345678`). Customers type numbers in whatever form
//! they are used to, so every number is mapped to that single canonical form
//! before it is placed in a request.

use crate::error::{PaymentError, PaymentResult};
use serde::{Deserialize, Serialize};

/// Dialling rules for the market we collect payments in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneFormat {
    /// Country calling code without `+` (e.g. "254")
    pub country_code: String,
    /// Digit dialled before the subscriber number for local calls
    pub trunk_prefix: char,
    /// Length of the subscriber number after trunk prefix / country code
    pub subscriber_digits: usize,
}

impl PhoneFormat {
    /// Kenyan numbering plan (the only market Daraja serves)
    pub fn kenya() -> Self {
        Self {
            country_code: "254".to_string(),
            trunk_prefix: '0',
            subscriber_digits: 9,
        }
    }

    /// Normalize a phone number to `<country code><subscriber digits>`.
    ///
    /// Accepted inputs (surrounding whitespace ignored):
    /// - `+254712345678` → `254712345678`
    /// - `254712345678`  → `254712345678`
    /// - `0712345678`    → `254712345678`
    ///
    /// Anything else fails with [`PaymentError::Validation`].
    pub fn normalize(&self, raw: &str) -> PaymentResult<String> {
        let input = raw.trim();

        let subscriber = if let Some(rest) = input.strip_prefix('+') {
            rest.strip_prefix(self.country_code.as_str())
        } else if let Some(rest) = input.strip_prefix(self.country_code.as_str()) {
            Some(rest)
        } else {
            input.strip_prefix(self.trunk_prefix)
        };

        match subscriber {
            Some(digits) if self.is_subscriber_number(digits) => {
                Ok(format!("{}{}", self.country_code, digits))
            }
            _ => Err(PaymentError::Validation("invalid phone format".to_string())),
        }
    }

    fn is_subscriber_number(&self, digits: &str) -> bool {
        digits.len() == self.subscriber_digits && digits.bytes().all(|b| b.is_ascii_digit())
    }
}

impl Default for PhoneFormat {
    fn default() -> Self {
        Self::kenya()
    }
}

/// Normalize using the default (Kenyan) numbering plan
pub fn normalize_phone(raw: &str) -> PaymentResult<String> {
    PhoneFormat::default().normalize(raw)
}
