//! Remote catalog
//!
//! Product lookup backed by an HTTP endpoint that serves one product per
//! code, e.g. `GET {base_url}/{code}`. Only the `title` and `price` fields of
//! the payload are read.

use std::time::Duration;

use async_trait::async_trait;
use num_traits::ToPrimitive;
use reqwest::Client;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    catalog::CatalogResolver,
    products::{Product, ProductCode},
};

/// Configuration for the remote lookup endpoint.
#[derive(Debug, Clone)]
pub struct RemoteCatalogConfig {
    /// Endpoint base URL, e.g. `"https://dummyjson.com/products"`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Currency remote prices are quoted in. The payload carries a bare
    /// number, so the currency has to be agreed out of band.
    pub currency: &'static Currency,
}

/// Errors from the remote lookup transport.
///
/// These never reach the till: [`RemoteCatalog::resolve`] collapses them to
/// `None` after logging. They surface only from construction.
#[derive(Debug, Error)]
pub enum RemoteCatalogError {
    /// HTTP client construction or transport failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Product payload fields the till reads.
#[derive(Debug, Deserialize)]
struct ProductBody {
    title: String,
    price: f64,
}

/// Code lookup against a remote product endpoint.
///
/// Input is trimmed but otherwise forwarded untouched, so the endpoint
/// decides what counts as a valid code.
#[derive(Debug, Clone)]
pub struct RemoteCatalog {
    config: RemoteCatalogConfig,
    http: Client,
}

impl RemoteCatalog {
    /// Create a new catalog from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: RemoteCatalogConfig) -> Result<Self, RemoteCatalogError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, http })
    }

    /// Fetch one product payload by code.
    async fn fetch(&self, code: &ProductCode) -> Result<ProductBody, RemoteCatalogError> {
        let url = format!("{}/{code}", self.config.base_url.trim_end_matches('/'));

        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();

            return Err(RemoteCatalogError::UnexpectedResponse(format!(
                "lookup of {code} failed with status {status}"
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CatalogResolver for RemoteCatalog {
    async fn resolve(&self, raw: &str) -> Option<Product> {
        let code = ProductCode::trimmed(raw);

        if code.is_empty() {
            return None;
        }

        let body = match self.fetch(&code).await {
            Ok(body) => body,
            Err(error) => {
                tracing::warn!(code = %code, %error, "remote lookup failed; treating as not found");

                return None;
            }
        };

        let Some(price_minor) = price_to_minor(body.price) else {
            tracing::warn!(
                code = %code,
                price = body.price,
                "remote price is not usable; treating as not found"
            );

            return None;
        };

        Some(Product {
            code,
            name: body.title,
            price: Money::from_minor(price_minor, self.config.currency),
        })
    }
}

/// Convert a payload price (major units) to minor units.
///
/// Returns `None` for prices that are negative, non-finite, or outside the
/// representable range.
fn price_to_minor(price: f64) -> Option<i64> {
    let price = Decimal::from_f64_retain(price)?;

    if price.is_sign_negative() {
        return None;
    }

    price
        .checked_mul(Decimal::new(100, 0))?
        .round_dp(0)
        .to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_to_minor_rounds_to_whole_cents() {
        assert_eq!(price_to_minor(3.0), Some(300));
        assert_eq!(price_to_minor(0.6), Some(60));
        assert_eq!(price_to_minor(9.999), Some(1000));
    }

    #[test]
    fn price_to_minor_rejects_unusable_values() {
        assert_eq!(price_to_minor(-1.0), None);
        assert_eq!(price_to_minor(f64::NAN), None);
        assert_eq!(price_to_minor(f64::INFINITY), None);
    }

    #[test]
    fn new_applies_the_configured_timeout() {
        let catalog = RemoteCatalog::new(RemoteCatalogConfig {
            base_url: "http://localhost:1".to_string(),
            timeout: Duration::from_millis(250),
            currency: rusty_money::iso::USD,
        });

        assert!(catalog.is_ok());
    }
}
