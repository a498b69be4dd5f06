//! # pay-mpesa
//!
//! M-Pesa push-payment gateway for lunark, built on Safaricom's Daraja API
//! (Lipa Na M-Pesa Online / STK push).
//!
//! A push asks Safaricom to pop a PIN prompt on the payer's phone. The call
//! only tells us the prompt was queued; the final outcome is delivered later
//! to `MPESA_CALLBACK_URL` by Safaricom.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_mpesa::MpesaClient;
//!
//! // Create client from environment
//! let client = MpesaClient::from_env()?;
//!
//! let receipt = client
//!     .initiate_push("0712345678", "150", "LUNARK", "Order payment")
//!     .await?;
//!
//! println!("{}", receipt.customer_message);
//! ```

pub mod client;
pub mod config;
pub mod credentials;

// Re-exports
pub use client::{AccessToken, MpesaClient, StkPushRequest, TransactionType};
pub use config::{MpesaConfig, MpesaEnvironment};
pub use credentials::{basic_credentials, derive_password, format_timestamp};
