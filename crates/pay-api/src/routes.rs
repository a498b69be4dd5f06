//! # Routes
//!
//! Axum router configuration for the payment API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health - Health check
/// - GET  /api/v1/products - List active products
/// - GET  /api/v1/products/{product_id} - Get product by ID
/// - POST /api/v1/checkout/summary - Price a cart
/// - POST /api/v1/checkout - Price a cart and start an STK push for the total
/// - POST /api/v1/payments - Start an STK push for an explicit amount
/// - GET  /api/v1/payments/{attempt_id} - Current state of an attempt
pub fn create_router(state: AppState) -> Router {
    // The storefront app calls from arbitrary origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Products
        .route("/products", get(handlers::list_products))
        .route("/products/{product_id}", get(handlers::get_product))
        // Checkout
        .route("/checkout/summary", post(handlers::checkout_summary))
        .route("/checkout", post(handlers::checkout))
        // Payments
        .route("/payments", post(handlers::create_payment))
        .route("/payments/{attempt_id}", get(handlers::get_payment));

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // API v1
        .nest("/api/v1", api_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
