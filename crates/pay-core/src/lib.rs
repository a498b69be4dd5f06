//! # pay-core
//!
//! Core types and traits for the lunark push-payment engine.
//!
//! This crate provides:
//! - `PushPaymentGateway` trait for mobile-money providers
//! - `PushOrder`, `PushReceipt` and `PaymentState` for a single payment attempt
//! - `PhoneFormat` for canonical MSISDN normalization
//! - `Product`, `Cart`, `Order` and `CheckoutSummary` for checkout pricing
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{Cart, CheckoutSummary, Order, PricingPolicy, PushOrder};
//!
//! let cart = Cart::new().with_item("hp-01", 1);
//! let order = Order::from_cart(&cart, &catalog)?;
//! let summary = CheckoutSummary::compute(&order, &PricingPolicy::default())?;
//!
//! let push = PushOrder::new("0712345678", summary.payable_amount()?, order.reference(), "Lunark order");
//! let receipt = gateway.initiate_push(&push).await?;
//! ```

pub mod checkout;
pub mod error;
pub mod gateway;
pub mod order;
pub mod phone;
pub mod product;
pub mod push;

// Re-exports for convenience
pub use checkout::{CheckoutSummary, PricingPolicy};
pub use error::{PaymentError, PaymentResult};
pub use gateway::{BoxedPushGateway, PushPaymentGateway};
pub use order::{Cart, LineItem, Order};
pub use phone::{normalize_phone, PhoneFormat};
pub use product::{Price, Product, ProductCatalog};
pub use push::{validate_amount, PaymentState, PushOrder, PushReceipt};
