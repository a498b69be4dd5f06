//! # pay-api
//!
//! HTTP API layer for lunark push payments.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Checkout pricing endpoints
//! - Asynchronous M-Pesa payment attempts with pollable state
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/products` | List products |
//! | GET | `/api/v1/products/{id}` | Get product |
//! | POST | `/api/v1/checkout/summary` | Price a cart |
//! | POST | `/api/v1/checkout` | Price a cart and push the total |
//! | POST | `/api/v1/payments` | Push an explicit amount |
//! | GET | `/api/v1/payments/{attempt_id}` | Payment attempt state |

pub mod handlers;
pub mod routes;
pub mod state;
pub mod tracker;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
pub use tracker::{PaymentSubscription, PaymentTracker};
