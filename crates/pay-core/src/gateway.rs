//! # Push Payment Gateway Trait
//!
//! Seam between the service layer and a mobile-money provider.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        PushPaymentGateway (trait)           │
//! │  ├── initiate_push()                        │
//! │  └── provider_name()                        │
//! └─────────────────────────────────────────────┘
//!                       ▲
//!          ┌────────────┴────────────┐
//!  ┌───────┴───────┐         ┌───────┴───────┐
//!  │  MpesaClient  │         │  test doubles │
//!  └───────────────┘         └───────────────┘
//! ```

use crate::error::PaymentResult;
use crate::push::{PushOrder, PushReceipt};
use async_trait::async_trait;
use std::sync::Arc;

/// A provider able to send a payment prompt to a payer's handset.
#[async_trait]
pub trait PushPaymentGateway: Send + Sync {
    /// Submit one push request.
    ///
    /// Implementations perform exactly one submission per call and never
    /// retry; every error is terminal for the invocation.
    async fn initiate_push(&self, order: &PushOrder) -> PaymentResult<PushReceipt>;

    /// Get the provider name (for logging and routing).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared gateway (dynamic dispatch)
pub type BoxedPushGateway = Arc<dyn PushPaymentGateway>;
