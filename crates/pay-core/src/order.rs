//! # Order Types
//!
//! Cart and order types. A cart is what the customer keeps on their profile
//! (`product_id → quantity`); an order is the cart resolved against the catalog.

use crate::error::{PaymentError, PaymentResult};
use crate::product::{Price, Product, ProductCatalog};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Largest quantity accepted for a single cart line
pub const MAX_LINE_QUANTITY: u32 = 1_000;

pub(crate) fn amount_overflow() -> PaymentError {
    PaymentError::InvalidRequest("Order amount is too large".to_string())
}

/// Items a customer intends to buy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: BTreeMap<String, u32>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of a product
    pub fn add(&mut self, product_id: impl Into<String>, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let qty = self.items.entry(product_id.into()).or_insert(0);
        *qty = qty.saturating_add(quantity);
    }

    /// Builder form of [`Cart::add`]
    pub fn with_item(mut self, product_id: impl Into<String>, quantity: u32) -> Self {
        self.add(product_id, quantity);
        self
    }

    /// Remove one unit; drops the entry when it reaches zero
    pub fn remove_one(&mut self, product_id: &str) {
        if let Some(qty) = self.items.get_mut(product_id) {
            *qty -= 1;
            if *qty == 0 {
                self.items.remove(product_id);
            }
        }
    }

    pub fn quantity(&self, product_id: &str) -> u32 {
        self.items.get(product_id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(id, qty)| (id.as_str(), *qty))
    }
}

/// A line item in an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Product ID
    pub product_id: String,

    /// Product title (denormalized for display)
    pub title: String,

    /// Price the customer pays per unit
    pub unit_price: Price,

    /// Quantity
    pub quantity: u32,
}

impl LineItem {
    /// Create a line item from a product
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            title: product.title.clone(),
            unit_price: product.actual_price,
            quantity,
        }
    }

    /// Calculate the total price for this line item
    pub fn total(&self) -> PaymentResult<Price> {
        self.unit_price
            .checked_mul(self.quantity)
            .ok_or_else(amount_overflow)
    }
}

/// A cart resolved against the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID (generated)
    pub id: Uuid,

    /// Line items
    pub line_items: Vec<LineItem>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Resolve every cart entry against the catalog.
    ///
    /// Fails on an empty cart, unknown or inactive products, and lines above
    /// [`MAX_LINE_QUANTITY`].
    pub fn from_cart(cart: &Cart, catalog: &ProductCatalog) -> PaymentResult<Self> {
        if cart.is_empty() {
            return Err(PaymentError::InvalidRequest("Cart is empty".to_string()));
        }

        let line_items = cart
            .iter()
            .map(|(product_id, quantity)| -> PaymentResult<LineItem> {
                let product = catalog.get(product_id).ok_or_else(|| {
                    PaymentError::ProductNotFound {
                        product_id: product_id.to_string(),
                    }
                })?;
                if !product.active {
                    return Err(PaymentError::InvalidRequest(format!(
                        "Product is not available: {}",
                        product_id
                    )));
                }
                if quantity > MAX_LINE_QUANTITY {
                    return Err(PaymentError::InvalidRequest(format!(
                        "Quantity {} for {} exceeds the limit of {}",
                        quantity, product_id, MAX_LINE_QUANTITY
                    )));
                }
                Ok(LineItem::from_product(product, quantity))
            })
            .collect::<PaymentResult<Vec<_>>>()?;

        Ok(Self {
            id: Uuid::new_v4(),
            line_items,
            created_at: Utc::now(),
        })
    }

    /// Sum of line totals before discount and tax
    pub fn subtotal(&self) -> PaymentResult<Price> {
        self.line_items.iter().try_fold(Price::ZERO, |acc, item| {
            acc.checked_add(item.total()?).ok_or_else(amount_overflow)
        })
    }

    /// Short reference suitable for a payer statement
    pub fn reference(&self) -> String {
        self.id.simple().to_string()[..12].to_uppercase()
    }

    /// Get item count
    pub fn item_count(&self) -> u32 {
        self.line_items
            .iter()
            .fold(0u32, |acc, i| acc.saturating_add(i.quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ProductCatalog {
        let mut catalog = ProductCatalog::new();
        catalog.add(
            Product::new("hp-01", "Headphones", Price::from_shillings(4500.0))
                .with_actual_price(Price::from_shillings(3999.0)),
        );
        catalog.add(Product::new("cb-01", "Cable", Price::from_shillings(250.0)));
        catalog.add(Product::new("old-01", "Discontinued", Price::from_shillings(10.0)).inactive());
        catalog
    }

    #[test]
    fn test_cart_quantities() {
        let mut cart = Cart::new().with_item("hp-01", 1).with_item("hp-01", 2);
        cart.add("cb-01", 0);
        assert_eq!(cart.quantity("hp-01"), 3);
        assert_eq!(cart.quantity("cb-01"), 0);

        cart.remove_one("hp-01");
        assert_eq!(cart.quantity("hp-01"), 2);
        cart.remove_one("hp-01");
        cart.remove_one("hp-01");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_order_from_cart_uses_actual_price() {
        let cart = Cart::new().with_item("hp-01", 2).with_item("cb-01", 1);
        let order = Order::from_cart(&cart, &catalog()).unwrap();

        assert_eq!(order.line_items.len(), 2);
        assert_eq!(order.item_count(), 3);
        assert_eq!(
            order.subtotal().unwrap(),
            Price::from_shillings(2.0 * 3999.0 + 250.0)
        );
        assert_eq!(order.reference().len(), 12);
    }

    #[test]
    fn test_order_rejects_bad_carts() {
        assert!(matches!(
            Order::from_cart(&Cart::new(), &catalog()),
            Err(PaymentError::InvalidRequest(_))
        ));
        assert!(matches!(
            Order::from_cart(&Cart::new().with_item("nope", 1), &catalog()),
            Err(PaymentError::ProductNotFound { .. })
        ));
        assert!(matches!(
            Order::from_cart(&Cart::new().with_item("old-01", 1), &catalog()),
            Err(PaymentError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_quantity_above_limit_rejected() {
        let at_limit = Cart::new().with_item("hp-01", MAX_LINE_QUANTITY);
        let order = Order::from_cart(&at_limit, &catalog()).unwrap();
        assert_eq!(
            order.subtotal().unwrap(),
            Price::from_shillings(3999.0 * MAX_LINE_QUANTITY as f64)
        );

        let cart = Cart::new().with_item("hp-01", u32::MAX);
        assert!(matches!(
            Order::from_cart(&cart, &catalog()),
            Err(PaymentError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_line_total_overflow_is_an_error() {
        let line = LineItem {
            product_id: "big".into(),
            title: "Big".into(),
            unit_price: Price::from_cents(i64::MAX / 2),
            quantity: 3,
        };
        assert!(matches!(line.total(), Err(PaymentError::InvalidRequest(_))));

        let order = Order {
            id: Uuid::new_v4(),
            line_items: vec![
                LineItem { quantity: 1, ..line.clone() },
                LineItem { quantity: 2, ..line },
            ],
            created_at: Utc::now(),
        };
        assert!(matches!(order.subtotal(), Err(PaymentError::InvalidRequest(_))));
    }

    #[test]
    fn test_cart_add_saturates() {
        let cart = Cart::new().with_item("hp-01", u32::MAX).with_item("hp-01", 5);
        assert_eq!(cart.quantity("hp-01"), u32::MAX);
    }

    #[test]
    fn test_cart_json_shape() {
        let cart: Cart = serde_json::from_str(r#"{"hp-01": 2, "cb-01": 1}"#).unwrap();
        assert_eq!(cart.quantity("hp-01"), 2);
        assert_eq!(cart.quantity("cb-01"), 1);
    }
}
