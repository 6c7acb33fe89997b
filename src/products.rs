//! Products
//!
//! Product codes as shoppers type them, and the catalog entries they resolve to.

use std::fmt;

use rusty_money::{Money, iso::Currency};

/// Money in the till's display currency.
pub type Price = Money<'static, Currency>;

/// A product code as submitted at the till.
///
/// Codes are opaque strings. How much of the raw input becomes the code is a
/// catalog concern: the fixed table keeps only the leading digit run, while a
/// remote lookup forwards the trimmed input untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ProductCode(String);

impl ProductCode {
    /// Builds a code from input taken verbatim, minus surrounding whitespace.
    #[must_use]
    pub fn trimmed(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    /// Builds a code from the leading run of ASCII digits in the trimmed input.
    ///
    /// `"1001abc"` becomes `"1001"`, `"  1002  "` becomes `"1002"`, and input
    /// with no leading digit becomes the empty code.
    #[must_use]
    pub fn leading_digits(raw: &str) -> Self {
        Self(
            raw.trim()
                .chars()
                .take_while(char::is_ascii_digit)
                .collect(),
        )
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when no code survived normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A product resolved from a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Code the product resolved under.
    pub code: ProductCode,

    /// Display name.
    pub name: String,

    /// Unit price.
    pub price: Price,
}
