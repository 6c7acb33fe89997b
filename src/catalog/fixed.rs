//! Fixed catalog
//!
//! An in-memory code table loaded from YAML. The till ships with a built-in
//! table; an alternative file can be supplied at startup.

use std::{fs, path::Path};

use async_trait::async_trait;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD},
};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    catalog::CatalogResolver,
    products::{Product, ProductCode},
};

/// The product table compiled into the binary.
const BUILTIN_TABLE: &str = include_str!("../../fixtures/catalog.yml");

/// Errors that can occur while loading a catalog table.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading a catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between catalog entries
    #[error("Currency mismatch in catalog: {0} vs {1}")]
    CurrencyMismatch(String, String),

    /// Catalog has no entries
    #[error("Catalog has no entries; cannot determine currency")]
    Empty,
}

/// Wrapper for the product table in YAML
#[derive(Debug, Deserialize)]
struct CatalogFixture {
    /// Map of product code -> entry
    products: FxHashMap<String, EntryFixture>,
}

/// One product entry from YAML
#[derive(Debug, Deserialize)]
struct EntryFixture {
    /// Product name
    name: String,

    /// Product price (e.g., "3.00 USD")
    price: String,
}

/// One loaded table entry. Prices are held in minor units; the currency is
/// shared across the whole table.
#[derive(Debug, Clone)]
struct Entry {
    name: String,
    price_minor: i64,
}

/// Exact-match lookup over a fixed code table.
///
/// Input is normalized to its leading digit run before the lookup, so
/// `"1001abc"` still finds the entry keyed `"1001"`.
#[derive(Debug, Clone)]
pub struct FixedCatalog {
    entries: FxHashMap<String, Entry>,
    currency: &'static Currency,
}

impl FixedCatalog {
    /// Loads the table compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the embedded table fails to parse, which
    /// indicates a packaging defect rather than a runtime condition.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(BUILTIN_TABLE)
    }

    /// Parses a table from YAML text.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the YAML is malformed, a price cannot be
    /// parsed, the table mixes currencies, or the table is empty.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(yaml)?;

        let mut entries = FxHashMap::default();
        let mut table_currency: Option<&'static Currency> = None;

        for (code, entry) in fixture.products {
            let (price_minor, currency) = parse_price(&entry.price)?;

            match table_currency {
                None => table_currency = Some(currency),
                Some(existing) if existing != currency => {
                    return Err(CatalogError::CurrencyMismatch(
                        existing.iso_alpha_code.to_string(),
                        currency.iso_alpha_code.to_string(),
                    ));
                }
                Some(_) => {}
            }

            _ = entries.insert(
                code,
                Entry {
                    name: entry.name,
                    price_minor,
                },
            );
        }

        let currency = table_currency.ok_or(CatalogError::Empty)?;

        Ok(Self { entries, currency })
    }

    /// Reads and parses a table from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file cannot be read or its contents
    /// fail to parse.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// The currency every entry is priced in.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Number of entries in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the table holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, code: &ProductCode) -> Option<Product> {
        let entry = self.entries.get(code.as_str())?;

        Some(Product {
            code: code.clone(),
            name: entry.name.clone(),
            price: Money::from_minor(entry.price_minor, self.currency),
        })
    }
}

#[async_trait]
impl CatalogResolver for FixedCatalog {
    async fn resolve(&self, raw: &str) -> Option<Product> {
        let code = ProductCode::leading_digits(raw);

        if code.is_empty() {
            return None;
        }

        self.lookup(&code)
    }
}

/// Parse price string (e.g., "2.99 USD") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed or is negative, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), CatalogError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(CatalogError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    }

    let amount = parts
        .first()
        .ok_or_else(|| CatalogError::InvalidPrice(s.to_string()))?
        .parse::<Decimal>()
        .map_err(|_err| CatalogError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| CatalogError::InvalidPrice(s.to_string()))?;

    // Shelf prices are never negative.
    if minor_units < 0 {
        return Err(CatalogError::InvalidPrice(s.to_string()));
    }

    let currency_code = parts
        .get(1)
        .ok_or_else(|| CatalogError::InvalidPrice(s.to_string()))?;

    let currency = parse_currency(currency_code)?;

    Ok((minor_units, currency))
}

/// Resolve an ISO alpha code to a supported currency.
///
/// # Errors
///
/// Returns [`CatalogError::UnknownCurrency`] for codes outside the supported
/// set.
pub fn parse_currency(code: &str) -> Result<&'static Currency, CatalogError> {
    match code {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(CatalogError::UnknownCurrency(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn builtin_table_has_the_full_product_range() -> TestResult {
        let catalog = FixedCatalog::builtin()?;

        assert_eq!(catalog.len(), 16);
        assert_eq!(catalog.currency(), USD);

        Ok(())
    }

    #[tokio::test]
    async fn resolves_known_codes_to_name_and_price() -> TestResult {
        let catalog = FixedCatalog::builtin()?;

        let milk = catalog.resolve("1001").await;
        let apple = catalog.resolve("1002").await;

        assert_eq!(
            milk.as_ref().map(|product| product.name.as_str()),
            Some("Leche descremada")
        );
        assert_eq!(
            milk.map(|product| product.price),
            Some(Money::from_minor(300, USD))
        );
        assert_eq!(
            apple.as_ref().map(|product| product.name.as_str()),
            Some("Manzana Fiji")
        );
        assert_eq!(
            apple.map(|product| product.price),
            Some(Money::from_minor(60, USD))
        );

        Ok(())
    }

    #[tokio::test]
    async fn resolve_keeps_only_the_leading_digit_run() -> TestResult {
        let catalog = FixedCatalog::builtin()?;

        let product = catalog.resolve("  1003abc  ").await;

        assert_eq!(
            product.map(|product| product.name),
            Some("Pepino Ingles".to_string())
        );

        Ok(())
    }

    #[tokio::test]
    async fn unknown_codes_resolve_to_none() -> TestResult {
        let catalog = FixedCatalog::builtin()?;

        assert!(catalog.resolve("9999").await.is_none());
        assert!(catalog.resolve("abc").await.is_none());
        assert!(catalog.resolve("").await.is_none());

        Ok(())
    }

    #[test]
    fn from_yaml_rejects_mixed_currencies() {
        let yaml = r#"
products:
  "1001":
    name: Leche descremada
    price: "3.00 USD"
  "1002":
    name: Manzana Fiji
    price: "0.60 EUR"
"#;

        let result = FixedCatalog::from_yaml(yaml);

        assert!(matches!(result, Err(CatalogError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn from_yaml_rejects_an_empty_table() {
        let result = FixedCatalog::from_yaml("products: {}\n");

        assert!(matches!(result, Err(CatalogError::Empty)));
    }

    #[test]
    fn from_path_loads_a_table_from_disk() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("catalog.yml");

        std::fs::write(
            &path,
            r#"
products:
  "2001":
    name: Pan integral
    price: "1.25 USD"
"#,
        )?;

        let catalog = FixedCatalog::from_path(&path)?;

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.currency(), USD);

        Ok(())
    }

    #[test]
    fn parse_price_handles_the_supported_currencies() -> TestResult {
        assert_eq!(parse_price("3.00 USD")?, (300, USD));
        assert_eq!(parse_price("2.99 GBP")?, (299, GBP));
        assert_eq!(parse_price("10 EUR")?, (1000, EUR));

        Ok(())
    }

    #[test]
    fn parse_price_rejects_malformed_input() {
        assert!(matches!(
            parse_price("3.00"),
            Err(CatalogError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("three USD"),
            Err(CatalogError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("-1.00 USD"),
            Err(CatalogError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("3.00 XYZ"),
            Err(CatalogError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn parse_currency_rejects_unsupported_codes() {
        assert!(parse_currency("USD").is_ok());
        assert!(matches!(
            parse_currency("JPY"),
            Err(CatalogError::UnknownCurrency(_))
        ));
    }
}
