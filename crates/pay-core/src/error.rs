//! # Payment Error Types
//!
//! Typed error handling for the lunark payment engine.
//! All payment operations return `Result<T, PaymentError>`.

use thiserror::Error;

/// Core error type for all payment operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Connectivity failure or timeout talking to the provider
    #[error("Network error: {cause}")]
    Network { cause: String },

    /// Provider rejected our consumer credentials
    #[error("Failed to get access token: {http_status} - {body}")]
    Auth { http_status: u16, body: String },

    /// Provider rejected the push request
    #[error("STK push failed: {http_status} - {body}")]
    Provider { http_status: u16, body: String },

    /// Malformed local input (phone number, amount, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Product not found in catalog
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Unknown or evicted payment attempt
    #[error("Payment attempt not found: {attempt_id}")]
    AttemptNotFound { attempt_id: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaymentError {
    pub fn network(cause: impl ToString) -> Self {
        PaymentError::Network {
            cause: cause.to_string(),
        }
    }

    /// Returns true if the caller may reasonably re-invoke the operation.
    ///
    /// Nothing in this workspace retries on its own; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::Network { .. } => true,
            PaymentError::Provider { http_status, .. } => *http_status >= 500,
            _ => false,
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Network { .. } => 503,
            PaymentError::Auth { .. } => 502,
            PaymentError::Provider { .. } => 502,
            PaymentError::Validation(_) => 400,
            PaymentError::Configuration(_) => 500,
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::ProductNotFound { .. } => 404,
            PaymentError::AttemptNotFound { .. } => 404,
            PaymentError::Serialization(_) => 502,
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PaymentError::network("timeout").is_retryable());
        assert!(PaymentError::Provider {
            http_status: 503,
            body: "unavailable".into()
        }
        .is_retryable());
        assert!(!PaymentError::Provider {
            http_status: 400,
            body: "bad request".into()
        }
        .is_retryable());
        assert!(!PaymentError::Validation("invalid phone format".into()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(PaymentError::Validation("x".into()).status_code(), 400);
        assert_eq!(
            PaymentError::Auth {
                http_status: 401,
                body: String::new()
            }
            .status_code(),
            502
        );
        assert_eq!(
            PaymentError::ProductNotFound {
                product_id: "x".into()
            }
            .status_code(),
            404
        );
        assert_eq!(PaymentError::network("refused").status_code(), 503);
    }

    #[test]
    fn test_display_carries_status_and_body() {
        let err = PaymentError::Provider {
            http_status: 500,
            body: "{\"errorMessage\":\"boom\"}".into(),
        };
        assert_eq!(
            err.to_string(),
            "STK push failed: 500 - {\"errorMessage\":\"boom\"}"
        );
    }
}
