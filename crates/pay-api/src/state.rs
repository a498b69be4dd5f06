//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the payment gateway, attempt tracker, configuration, and product catalog.

use crate::tracker::{PaymentTracker, DEFAULT_MAX_ATTEMPTS};
use anyhow::Context;
use pay_core::{BoxedPushGateway, PhoneFormat, PricingPolicy, ProductCatalog};
use pay_mpesa::MpesaClient;
use std::sync::Arc;
use tracing::warn;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Discount applied at checkout, in percent
    pub discount_percent: f64,
    /// Tax applied at checkout, in percent
    pub tax_percent: f64,
    /// How many payment attempts stay observable
    pub max_tracked_attempts: usize,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8080)?,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            discount_percent: parse_var("DISCOUNT_PERCENT", 0.0)?,
            tax_percent: parse_var("TAX_PERCENT", 0.0)?,
            max_tracked_attempts: parse_var("MAX_TRACKED_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn pricing(&self) -> anyhow::Result<PricingPolicy> {
        PricingPolicy::from_percentages(self.discount_percent, self.tax_percent)
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Push payment provider
    pub gateway: BoxedPushGateway,
    /// In-flight and recent payment attempts
    pub payments: PaymentTracker,
    /// Product catalog
    pub catalog: Arc<ProductCatalog>,
    /// Checkout discount/tax
    pub pricing: PricingPolicy,
    /// Numbering plan used to validate payer phones up front
    pub phone_format: PhoneFormat,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Build state with the M-Pesa gateway configured from the environment
    pub async fn from_env() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        // Load product catalog
        let catalog = load_product_catalog()?;

        let mpesa = MpesaClient::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize M-Pesa: {}", e))?;

        if let Err(e) = mpesa.check_connection().await {
            warn!("M-Pesa connection check failed, continuing: {}", e);
        }

        let phone_format = mpesa.config().phone_format.clone();

        let mut state = Self::new(config, Arc::new(mpesa), catalog)?;
        state.phone_format = phone_format;
        Ok(state)
    }

    /// Assemble state from parts
    pub fn new(
        config: AppConfig,
        gateway: BoxedPushGateway,
        catalog: ProductCatalog,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            gateway,
            payments: PaymentTracker::new(config.max_tracked_attempts),
            catalog: Arc::new(catalog),
            pricing: config.pricing()?,
            phone_format: PhoneFormat::default(),
            config,
        })
    }
}

/// Load product catalog from config file
pub fn load_product_catalog() -> anyhow::Result<ProductCatalog> {
    // Try to load from config/products.toml
    let config_paths = [
        "config/products.toml",
        "../config/products.toml",
        "../../config/products.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = ProductCatalog::from_toml(&content)
                .with_context(|| format!("Failed to parse {}", path))?;
            tracing::info!("Loaded {} products from {}", catalog.products.len(), path);
            return Ok(catalog);
        }
    }

    // Return empty catalog if no config found
    warn!("No product catalog found, using empty catalog");
    Ok(ProductCatalog::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        // Clear env vars for test
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("DISCOUNT_PERCENT");
        std::env::remove_var("TAX_PERCENT");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.pricing().unwrap(), PricingPolicy::default());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "test".to_string(),
            discount_percent: 0.0,
            tax_percent: 16.0,
            max_tracked_attempts: 8,
        };

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.pricing().unwrap().tax_bps, 1_600);
    }

    #[test]
    fn test_out_of_range_pricing_rejected() {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "test".to_string(),
            discount_percent: 150.0,
            tax_percent: 0.0,
            max_tracked_attempts: 8,
        };
        assert!(config.pricing().is_err());
    }
}
