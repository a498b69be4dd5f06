//! # Request Credentials
//!
//! Pure helpers for the values Daraja derives from shared secrets.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, TimeZone};

/// `yyyyMMddHHmmss`, the only timestamp layout the STK endpoint accepts
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Render a request timestamp in the offset the instant carries
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// `base64(short_code ‖ passkey ‖ timestamp)`
pub fn derive_password(short_code: &str, passkey: &str, timestamp: &str) -> String {
    let mut raw = String::with_capacity(short_code.len() + passkey.len() + timestamp.len());
    raw.push_str(short_code);
    raw.push_str(passkey);
    raw.push_str(timestamp);
    STANDARD.encode(raw)
}

/// `base64(consumer_key:consumer_secret)` for the OAuth `Basic` header
pub fn basic_credentials(consumer_key: &str, consumer_secret: &str) -> String {
    STANDARD.encode(format!("{}:{}", consumer_key, consumer_secret))
}
