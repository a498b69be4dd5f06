//! # Request Handlers
//!
//! Axum request handlers for the payment API.
//! Payment attempts are accepted with `202` and settle in the background;
//! clients poll `GET /api/v1/payments/{attempt_id}` for the outcome.

use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use pay_core::{
    Cart, CheckoutSummary, LineItem, Order, PaymentError, PaymentResult, PaymentState, PushOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

const DEFAULT_DESCRIPTION: &str = "Lunark order";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Price a cart without paying
#[derive(Debug, Deserialize)]
pub struct CheckoutSummaryRequest {
    /// `product_id → quantity`
    pub cart: Cart,
}

/// Price a cart and prompt the payer for the total
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// `product_id → quantity`
    pub cart: Cart,
    /// Payer phone number
    pub phone_number: String,
    /// Statement description (optional)
    #[serde(default)]
    pub description: Option<String>,
}

/// Prompt the payer for an explicit amount
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub phone_number: String,
    pub amount: String,
    pub account_reference: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Priced order
#[derive(Debug, Serialize)]
pub struct CheckoutSummaryResponse {
    pub order_id: Uuid,
    pub reference: String,
    pub line_items: Vec<LineItem>,
    pub summary: CheckoutSummary,
    /// Whole-shilling amount that will be pushed
    pub payable_amount: String,
    /// `Ksh.` formatted total for display
    pub total_display: String,
}

/// Accepted payment attempt
#[derive(Debug, Serialize)]
pub struct PaymentAttemptResponse {
    pub attempt_id: Uuid,
    #[serde(flatten)]
    pub state: PaymentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<CheckoutSummaryResponse>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn payment_error_to_response(err: PaymentError) -> ApiError {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn price_cart(state: &AppState, cart: &Cart) -> PaymentResult<CheckoutSummaryResponse> {
    let order = Order::from_cart(cart, &state.catalog)?;
    let summary = CheckoutSummary::compute(&order, &state.pricing)?;
    let payable_amount = summary.payable_amount()?;

    Ok(CheckoutSummaryResponse {
        order_id: order.id,
        reference: order.reference(),
        line_items: order.line_items,
        total_display: summary.total.display(),
        summary,
        payable_amount,
    })
}

fn description_or_default(description: Option<String>) -> String {
    description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string())
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "lunark-pay",
        "provider": state.gateway.provider_name(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Get products list
pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    let products: Vec<_> = state.catalog.active_products().collect();
    Json(serde_json::json!({
        "products": products,
        "count": products.len()
    }))
}

/// Get single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.catalog.get(&product_id).ok_or_else(|| {
        payment_error_to_response(PaymentError::ProductNotFound { product_id })
    })?;

    Ok(Json(product.clone()))
}

/// Price a cart
#[instrument(skip(state, request))]
pub async fn checkout_summary(
    State(state): State<AppState>,
    Json(request): Json<CheckoutSummaryRequest>,
) -> Result<Json<CheckoutSummaryResponse>, ApiError> {
    let priced = price_cart(&state, &request.cart).map_err(payment_error_to_response)?;
    Ok(Json(priced))
}

/// Price a cart and push the total to the payer's phone
#[instrument(skip(state, request))]
pub async fn checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<PaymentAttemptResponse>), ApiError> {
    let priced = price_cart(&state, &request.cart).map_err(payment_error_to_response)?;

    let order = PushOrder::new(
        request.phone_number,
        priced.payable_amount.clone(),
        priced.reference.clone(),
        description_or_default(request.description),
    );

    let mut response = start_attempt(&state, order)?;

    info!(
        "Checkout started: order={}, total={}, attempt={}",
        priced.order_id, priced.total_display, response.attempt_id
    );

    response.checkout = Some(priced);
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Push an explicit amount to the payer's phone
#[instrument(skip(state, request), fields(amount = %request.amount))]
pub async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentAttemptResponse>), ApiError> {
    let order = PushOrder::new(
        request.phone_number,
        request.amount,
        request.account_reference,
        description_or_default(request.description),
    );

    let response = start_attempt(&state, order)?;
    info!("Payment started: attempt={}", response.attempt_id);

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Current state of a payment attempt
pub async fn get_payment(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> Result<Json<PaymentAttemptResponse>, ApiError> {
    let current = state
        .payments
        .state(&attempt_id)
        .map_err(payment_error_to_response)?;

    Ok(Json(PaymentAttemptResponse {
        attempt_id,
        state: current,
        checkout: None,
    }))
}

/// Validate locally, then hand the attempt to the tracker
fn start_attempt(state: &AppState, order: PushOrder) -> Result<PaymentAttemptResponse, ApiError> {
    let order = order.validated(&state.phone_format).map_err(|e| {
        error!("Rejected payment request: {}", e);
        payment_error_to_response(e)
    })?;

    let (attempt_id, subscription) = state.payments.start(state.gateway.clone(), order);

    Ok(PaymentAttemptResponse {
        attempt_id,
        state: subscription.current(),
        checkout: None,
    })
}
