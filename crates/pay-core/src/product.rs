//! # Product Types
//!
//! Product catalog types for the lunark storefront.
//! Products are loaded from `config/products.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Price in Kenyan shilling cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price {
    pub cents: i64,
}

impl Price {
    pub const ZERO: Price = Price { cents: 0 };

    /// Create a price from a decimal shilling amount
    pub fn from_shillings(amount: f64) -> Self {
        Self {
            cents: (amount * 100.0).round() as i64,
        }
    }

    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Get the decimal amount
    pub fn as_decimal(&self) -> f64 {
        self.cents as f64 / 100.0
    }

    /// Whole shillings, rounding half up
    pub fn rounded_shillings(&self) -> i64 {
        self.cents.saturating_add(50).div_euclid(100)
    }

    /// Format for display (e.g., "Ksh.1250.00")
    pub fn display(&self) -> String {
        format!("Ksh.{:.2}", self.as_decimal())
    }

    pub fn checked_add(self, rhs: Price) -> Option<Price> {
        self.cents.checked_add(rhs.cents).map(Price::from_cents)
    }

    pub fn checked_sub(self, rhs: Price) -> Option<Price> {
        self.cents.checked_sub(rhs.cents).map(Price::from_cents)
    }

    /// Unit price times a quantity; `None` on overflow
    pub fn checked_mul(self, quantity: u32) -> Option<Price> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Price::from_cents)
    }
}

/// A product in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier
    pub id: String,

    /// Display title
    pub title: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Category (e.g., "headphones")
    #[serde(default)]
    pub category: String,

    /// List price, shown struck through
    pub price: Price,

    /// Price the customer actually pays
    pub actual_price: Price,

    /// Whether this product is active and available for purchase
    #[serde(default = "default_true")]
    pub active: bool,

    /// Image URLs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,

    /// Free-form specification table (brand, colour, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub other_details: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// Create a new product selling at its list price
    pub fn new(id: impl Into<String>, title: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category: String::new(),
            price,
            actual_price: price,
            active: true,
            images: Vec::new(),
            other_details: HashMap::new(),
        }
    }

    /// Builder: set a discounted selling price
    pub fn with_actual_price(mut self, price: Price) -> Self {
        self.actual_price = price;
        self
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Builder: set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Builder: add detail row
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.other_details.insert(key.into(), value.into());
        self
    }

    /// Builder: mark as unavailable
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Savings against the list price
    pub fn savings(&self) -> Price {
        Price::from_cents(self.price.cents.saturating_sub(self.actual_price.cents))
    }
}

/// Product catalog (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCatalog {
    pub products: Vec<Product>,
}

impl ProductCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
        }
    }

    /// Add a product to the catalog
    pub fn add(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Find a product by ID
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Get all active products
    pub fn active_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.active)
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
