//! Totals
//!
//! Derived figures for the sale in progress. Totals are never stored or
//! incrementally patched: every call recomputes the whole set from the cart,
//! so a rendered total can never drift from the lines behind it.

use decimal_percentage::Percentage;
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, MoneyError};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError},
    products::Price,
};

/// Flat promotional rate taken off every subtotal at this till.
#[must_use]
pub fn discount_rate() -> Percentage {
    Percentage::from(0.2)
}

/// Errors specific to totals calculations.
#[derive(Debug, Error)]
pub enum TotalsError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Errors bubbled up from the cart subtotal.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// One full set of figures derived from a cart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    subtotal: Price,
    discount: Price,
    total: Price,
    rate: Percentage,
}

impl Totals {
    /// Recomputes every figure from the cart's current lines.
    ///
    /// The discount is the standing rate applied to the subtotal, rounded to
    /// whole minor units with midpoints away from zero. The total is whatever
    /// remains after taking the discount off the subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`TotalsError`] if the subtotal cannot be summed or the
    /// discount cannot be represented in minor units.
    pub fn compute(cart: &Cart) -> Result<Self, TotalsError> {
        let rate = discount_rate();
        let subtotal = cart.subtotal()?;
        let discount_minor = percent_of_minor(rate, subtotal.to_minor_units())?;
        let discount = Money::from_minor(discount_minor, cart.currency());
        let total = subtotal.sub(discount)?;

        Ok(Self {
            subtotal,
            discount,
            total,
            rate,
        })
    }

    /// Sum of all line prices before the discount.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.subtotal
    }

    /// Amount taken off the subtotal.
    #[must_use]
    pub fn discount(&self) -> Price {
        self.discount
    }

    /// Amount due after the discount.
    #[must_use]
    pub fn total(&self) -> Price {
        self.total
    }

    /// The fractional rate the discount was computed at.
    #[must_use]
    pub fn rate(&self) -> Percentage {
        self.rate
    }
}

/// Calculate a percentage of a minor unit amount, in minor units.
fn percent_of_minor(rate: Percentage, minor: i64) -> Result<i64, TotalsError> {
    let Some(minor) = Decimal::from_i64(minor) else {
        unreachable!("always returns `Some` for every `i64`")
    };

    // `Percentage` is a fraction (e.g. 0.2); multiplying by one extracts it.
    let fraction = rate * Decimal::ONE;

    let Some(applied) = fraction.checked_mul(minor) else {
        return Err(TotalsError::PercentConversion);
    };

    let rounded = applied.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let Some(rounded) = rounded.to_i64() else {
        return Err(TotalsError::PercentConversion);
    };

    Ok(rounded)
}
