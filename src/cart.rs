//! Cart
//!
//! The in-memory cart is the single source of truth for the sale in progress.
//! Everything shown to the shopper (line listing, totals) is derived from it
//! on demand; nothing renders state that is not stored here.

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::products::{Price, Product, ProductCode};

/// Errors related to cart contents.
#[derive(Debug, Error)]
pub enum CartError {
    /// A line's currency differs from the till currency (code, line currency, till currency).
    #[error("line {0} is priced in {1}, but this till is configured for {2}")]
    CurrencyMismatch(ProductCode, &'static str, &'static str),

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// One cart line: a single unit of a resolved product.
///
/// Scanning the same code twice produces two independent lines. There is no
/// quantity column to merge into.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    code: ProductCode,
    name: String,
    price: Price,
}

impl CartLine {
    /// Code the line was added under.
    #[must_use]
    pub fn code(&self) -> &ProductCode {
        &self.code
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit price.
    #[must_use]
    pub fn price(&self) -> &Price {
        &self.price
    }
}

impl From<Product> for CartLine {
    fn from(product: Product) -> Self {
        Self {
            code: product.code,
            name: product.name,
            price: product.price,
        }
    }
}

/// An ordered collection of cart lines in a single currency.
#[derive(Debug)]
pub struct Cart {
    lines: Vec<CartLine>,
    currency: &'static Currency,
}

impl Cart {
    /// Creates an empty cart priced in `currency`.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            lines: Vec::new(),
            currency,
        }
    }

    /// Appends a resolved product as a new line and returns its position.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if the product is priced in a
    /// different currency than the cart.
    pub fn add(&mut self, product: Product) -> Result<usize, CartError> {
        if product.price.currency() != self.currency {
            return Err(CartError::CurrencyMismatch(
                product.code,
                product.price.currency().iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        self.lines.push(CartLine::from(product));

        Ok(self.lines.len() - 1)
    }

    /// Removes the line at `index`, returning it.
    ///
    /// Out-of-range positions are a no-op and return `None`.
    pub fn remove(&mut self, index: usize) -> Option<CartLine> {
        if index < self.lines.len() {
            Some(self.lines.remove(index))
        } else {
            None
        }
    }

    /// Drops every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sums all line prices. An empty cart sums to zero.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Money`] if the underlying money arithmetic fails.
    pub fn subtotal(&self) -> Result<Price, CartError> {
        let zero = Money::from_minor(0, self.currency);

        self.lines
            .iter()
            .try_fold(zero, |acc, line| acc.add(*line.price()))
            .map_err(CartError::from)
    }

    /// The line at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CartLine> {
        self.lines.get(index)
    }

    /// Iterates over lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter()
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` when the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The currency every line is priced in.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}
