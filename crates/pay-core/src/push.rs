//! # Push Payment Types
//!
//! Provider-neutral input and output of a single push-payment attempt, plus the
//! observable state an attempt moves through.

use crate::error::{PaymentError, PaymentResult};
use crate::phone::PhoneFormat;
use serde::{Deserialize, Serialize};

/// What the caller asks the provider to collect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushOrder {
    /// Payer phone number, in any format [`PhoneFormat::normalize`] accepts
    pub phone_number: String,
    /// Decimal amount as a string (e.g. "150" or "150.00")
    pub amount: String,
    /// Reference shown on the payer's statement
    pub account_reference: String,
    /// Free-form description of the transaction
    pub description: String,
}

impl PushOrder {
    pub fn new(
        phone_number: impl Into<String>,
        amount: impl Into<String>,
        account_reference: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            phone_number: phone_number.into(),
            amount: amount.into(),
            account_reference: account_reference.into(),
            description: description.into(),
        }
    }

    /// Check all local input and return a copy with the phone number normalized.
    ///
    /// Normalizing an already-normalized order is a no-op, so providers may
    /// call this again on orders that were validated upstream.
    pub fn validated(&self, format: &PhoneFormat) -> PaymentResult<Self> {
        let phone_number = format.normalize(&self.phone_number)?;
        validate_amount(&self.amount)?;

        if self.account_reference.trim().is_empty() {
            return Err(PaymentError::Validation(
                "account reference must not be empty".to_string(),
            ));
        }
        if self.description.trim().is_empty() {
            return Err(PaymentError::Validation(
                "transaction description must not be empty".to_string(),
            ));
        }

        Ok(Self {
            phone_number,
            amount: self.amount.trim().to_string(),
            account_reference: self.account_reference.clone(),
            description: self.description.clone(),
        })
    }
}

/// Amount must be a plain positive decimal: digits, optionally `.` and digits.
pub fn validate_amount(amount: &str) -> PaymentResult<()> {
    let amount = amount.trim();
    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (amount, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let well_formed = all_digits(whole) && fraction.map_or(true, all_digits);
    let positive = amount.bytes().any(|b| (b'1'..=b'9').contains(&b));

    if well_formed && positive {
        Ok(())
    } else {
        Err(PaymentError::Validation(format!("invalid amount: {:?}", amount)))
    }
}

/// Provider acknowledgement of an accepted push request.
///
/// Fields are carried exactly as the provider returned them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReceipt {
    pub merchant_request_id: String,
    pub checkout_request_id: String,
    pub response_code: String,
    pub response_description: String,
    pub customer_message: String,
}

impl PushReceipt {
    /// "0" means the prompt was queued to the payer's handset
    pub fn is_accepted(&self) -> bool {
        self.response_code == "0"
    }
}

/// Observable state of a payment attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentState {
    /// No attempt started yet
    Idle,
    /// Token fetch or push submission in flight
    Loading,
    /// Provider accepted the push request
    Success {
        merchant_request_id: String,
        checkout_request_id: String,
        response_code: String,
        description: String,
        customer_message: String,
    },
    /// Attempt failed; message is safe to show to the customer verbatim
    Error { message: String },
}

impl PaymentState {
    /// True once the attempt can no longer change
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentState::Success { .. } | PaymentState::Error { .. })
    }
}

impl Default for PaymentState {
    fn default() -> Self {
        PaymentState::Idle
    }
}

impl From<PushReceipt> for PaymentState {
    fn from(receipt: PushReceipt) -> Self {
        PaymentState::Success {
            merchant_request_id: receipt.merchant_request_id,
            checkout_request_id: receipt.checkout_request_id,
            response_code: receipt.response_code,
            description: receipt.response_description,
            customer_message: receipt.customer_message,
        }
    }
}

impl From<PaymentResult<PushReceipt>> for PaymentState {
    fn from(result: PaymentResult<PushReceipt>) -> Self {
        match result {
            Ok(receipt) => receipt.into(),
            Err(err) => PaymentState::Error {
                message: err.to_string(),
            },
        }
    }
}
