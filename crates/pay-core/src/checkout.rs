//! # Checkout Pricing
//!
//! Turns an order into the figures shown on the checkout page and the amount
//! pushed to the payer's phone.

use crate::error::{PaymentError, PaymentResult};
use crate::order::{amount_overflow, Order};
use crate::product::Price;
use serde::{Deserialize, Serialize};

/// Discount and tax rates in basis points (1% = 100 bps)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub discount_bps: u32,
    pub tax_bps: u32,
}

impl PricingPolicy {
    pub fn new(discount_bps: u32, tax_bps: u32) -> Self {
        Self {
            discount_bps,
            tax_bps,
        }
    }

    /// Build from percentages such as `10.0` or `16.5`
    pub fn from_percentages(discount_percent: f64, tax_percent: f64) -> PaymentResult<Self> {
        Ok(Self {
            discount_bps: percent_to_bps("discount", discount_percent)?,
            tax_bps: percent_to_bps("tax", tax_percent)?,
        })
    }
}

fn percent_to_bps(name: &str, percent: f64) -> PaymentResult<u32> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(PaymentError::Configuration(format!(
            "{} percentage must be between 0 and 100, got {}",
            name, percent
        )));
    }
    Ok((percent * 100.0).round() as u32)
}

/// `amount × bps / 10000`, rounded half up to the cent
fn apply_rate(amount: Price, bps: u32) -> PaymentResult<Price> {
    let scaled = amount
        .cents
        .checked_mul(i64::from(bps))
        .and_then(|c| c.checked_add(5_000))
        .ok_or_else(amount_overflow)?;
    Ok(Price::from_cents(scaled.div_euclid(10_000)))
}

/// Figures shown before the customer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSummary {
    pub subtotal: Price,
    pub discount: Price,
    pub tax: Price,
    pub total: Price,
}

impl CheckoutSummary {
    /// `total = subtotal − discount + tax`, where discount and tax are both
    /// taken on the subtotal.
    ///
    /// Fails with `InvalidRequest` when any figure leaves the `i64` cent range.
    pub fn compute(order: &Order, policy: &PricingPolicy) -> PaymentResult<Self> {
        let subtotal = order.subtotal()?;
        let discount = apply_rate(subtotal, policy.discount_bps)?;
        let tax = apply_rate(subtotal, policy.tax_bps)?;
        let total = subtotal
            .checked_sub(discount)
            .and_then(|p| p.checked_add(tax))
            .ok_or_else(amount_overflow)?;

        Ok(Self {
            subtotal,
            discount,
            tax,
            total,
        })
    }

    /// Amount to request from the payer, in whole shillings.
    ///
    /// Mobile money settles in whole units, so the total is rounded half up.
    pub fn payable_amount(&self) -> PaymentResult<String> {
        let shillings = self.total.rounded_shillings();
        if shillings <= 0 {
            return Err(PaymentError::InvalidRequest(format!(
                "Nothing to pay: total is {}",
                self.total.display()
            )));
        }
        Ok(shillings.to_string())
    }
}
