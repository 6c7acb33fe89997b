//! Kiosk
//!
//! The single application-state object behind the till. Every mutation goes
//! through a method here, and everything shown to the shopper is derived from
//! this state on demand.
//!
//! Asynchronous work (catalog lookups, payment settlement) is stamped with
//! the transaction id current when it started. Completions carrying an older
//! stamp are refused, so a sale that was reset can never be mutated by work
//! scheduled before the reset.

use std::{fmt, sync::Arc, time::Duration};

use rusty_money::iso::Currency;
use tokio_util::sync::CancellationToken;

use crate::{
    billing::BillingDetails,
    cart::{Cart, CartError, CartLine},
    catalog::CatalogResolver,
    payment::{PaymentMethod, PaymentOutcome, PaymentTicket, SETTLE_DELAY},
    products::Product,
    screens::{Modal, Navigator, Screen},
    totals::{Totals, TotalsError},
};

/// Transaction generation counter. Bumped on every reset; asynchronous
/// completions stamped with an older value are refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TxnId(u64);

impl TxnId {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A code lookup accepted for resolution, stamped with the transaction that
/// asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    txn: TxnId,
    input: String,
}

impl LookupRequest {
    /// The trimmed input to resolve.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Transaction the lookup belongs to.
    #[must_use]
    pub fn txn(&self) -> TxnId {
        self.txn
    }
}

/// What became of one submitted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeOutcome {
    /// The catalog knew the code; a line was appended at this position.
    Added {
        /// Index of the new cart line.
        index: usize,
    },

    /// The catalog had no answer. The cart is unchanged.
    NotFound {
        /// The input as submitted, for the alert.
        input: String,
    },

    /// The till was reset while the lookup was in flight; dropped.
    Stale,
}

/// Application state for one self-checkout till.
pub struct Kiosk {
    catalog: Arc<dyn CatalogResolver>,
    cart: Cart,
    navigator: Navigator,
    txn: TxnId,
    txn_token: CancellationToken,
    settle_delay: Duration,
}

impl fmt::Debug for Kiosk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kiosk")
            .field("txn", &self.txn)
            .field("screen", &self.navigator.screen())
            .field("cart_lines", &self.cart.len())
            .finish_non_exhaustive()
    }
}

impl Kiosk {
    /// Creates a till on the welcome screen with an empty cart and the
    /// standard settlement delay.
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogResolver>, currency: &'static Currency) -> Self {
        Self::with_settle_delay(catalog, currency, SETTLE_DELAY)
    }

    /// Creates a till with a custom settlement delay.
    #[must_use]
    pub fn with_settle_delay(
        catalog: Arc<dyn CatalogResolver>,
        currency: &'static Currency,
        settle_delay: Duration,
    ) -> Self {
        Self {
            catalog,
            cart: Cart::new(currency),
            navigator: Navigator::new(),
            txn: TxnId::default(),
            txn_token: CancellationToken::new(),
            settle_delay,
        }
    }

    /// The catalog codes are resolved against.
    #[must_use]
    pub fn catalog(&self) -> Arc<dyn CatalogResolver> {
        Arc::clone(&self.catalog)
    }

    /// The cart for the sale in progress.
    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Navigation state (active screen and open overlays).
    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// The currently active screen.
    #[must_use]
    pub fn screen(&self) -> Screen {
        self.navigator.screen()
    }

    /// The current transaction id.
    #[must_use]
    pub fn txn(&self) -> TxnId {
        self.txn
    }

    /// Token cancelled when the current transaction ends. Scheduled work
    /// should race against it.
    #[must_use]
    pub fn txn_token(&self) -> CancellationToken {
        self.txn_token.clone()
    }

    /// Delay configured between starting a payment and its settlement.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Accepts raw prompt input as a code lookup.
    ///
    /// Blank input is a silent no-op and yields `None`. Otherwise the trimmed
    /// input is stamped with the current transaction and handed back for the
    /// caller to resolve against the catalog.
    #[must_use]
    pub fn request_code(&self, raw: &str) -> Option<LookupRequest> {
        let input = raw.trim();

        if input.is_empty() {
            return None;
        }

        Some(LookupRequest {
            txn: self.txn,
            input: input.to_string(),
        })
    }

    /// Applies the result of a resolved lookup.
    ///
    /// Requests stamped with an older transaction are dropped as
    /// [`CodeOutcome::Stale`]. A missing product leaves the cart untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the resolved product cannot be added, for
    /// example when a remote catalog answers in a foreign currency.
    pub fn complete_lookup(
        &mut self,
        request: &LookupRequest,
        found: Option<Product>,
    ) -> Result<CodeOutcome, CartError> {
        if request.txn != self.txn {
            tracing::debug!(input = request.input(), "dropping lookup for an ended transaction");

            return Ok(CodeOutcome::Stale);
        }

        match found {
            Some(product) => {
                let index = self.cart.add(product)?;

                Ok(CodeOutcome::Added { index })
            }
            None => Ok(CodeOutcome::NotFound {
                input: request.input.clone(),
            }),
        }
    }

    /// Removes the cart line at `index`. Out-of-range positions are a no-op.
    pub fn remove_line(&mut self, index: usize) -> Option<CartLine> {
        self.cart.remove(index)
    }

    /// Recomputes subtotal, discount and total from the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`TotalsError`] if the figures cannot be derived.
    pub fn totals(&self) -> Result<Totals, TotalsError> {
        Totals::compute(&self.cart)
    }

    /// Jumps to the checkout screen to start scanning.
    pub fn begin_checkout(&mut self) {
        self.navigator.goto(Screen::Checkout);
    }

    /// Opens the billing details form.
    pub fn open_billing_form(&mut self) {
        self.navigator.goto(Screen::BillingForm);
    }

    /// Accepts the billing form and moves on to checkout.
    ///
    /// The details are collected for the current sale only; nothing validates
    /// or stores them.
    pub fn submit_billing(&mut self, details: &BillingDetails) {
        tracing::debug!(name_len = details.name().len(), "billing form accepted");

        self.navigator.goto(Screen::Checkout);
    }

    /// Opens the installment information overlay.
    pub fn show_credit_info(&mut self) {
        self.navigator.show(Modal::CreditInfo);
    }

    /// Starts a simulated payment: opens the pending overlay for `method`
    /// and hands back the ticket to schedule settlement with.
    pub fn begin_payment(&mut self, method: PaymentMethod) -> PaymentTicket {
        self.navigator.show(method.pending_modal());

        tracing::info!(method = method.label(), txn = %self.txn, "payment started");

        PaymentTicket::new(self.txn, method)
    }

    /// Applies a settled payment ticket.
    ///
    /// Tickets from an earlier transaction are refused as
    /// [`PaymentOutcome::Stale`] and change nothing. Otherwise the pending
    /// overlay closes and the thank-you overlay opens.
    pub fn settle_payment(&mut self, ticket: PaymentTicket) -> PaymentOutcome {
        if ticket.txn() != self.txn {
            tracing::debug!(
                method = ticket.method().label(),
                txn = %ticket.txn(),
                "refusing settlement for an ended transaction"
            );

            return PaymentOutcome::Stale;
        }

        _ = self.navigator.hide(ticket.method().pending_modal());
        self.navigator.show(Modal::ThankYou);

        tracing::info!(method = ticket.method().label(), txn = %self.txn, "payment settled");

        PaymentOutcome::Settled
    }

    /// Closes one overlay, or every overlay when `target` is `None`.
    pub fn close_modal(&mut self, target: Option<Modal>) {
        match target {
            Some(modal) => {
                _ = self.navigator.hide(modal);
            }
            None => self.navigator.hide_all(),
        }
    }

    /// Closes every open overlay, as the escape key does.
    pub fn escape(&mut self) {
        self.navigator.hide_all();
    }

    /// Ends the current transaction and returns the till to its idle state.
    ///
    /// The cart empties, every overlay closes, the welcome screen activates,
    /// and the transaction id advances. Work scheduled under the old
    /// transaction is cancelled through its token; anything already past
    /// cancellation is refused on arrival by the stamp check.
    pub fn reset(&mut self) {
        self.txn_token.cancel();
        self.txn_token = CancellationToken::new();
        self.txn = self.txn.next();

        self.cart.clear();
        self.navigator.hide_all();
        self.navigator.goto(Screen::Welcome);

        tracing::info!(txn = %self.txn, "till reset");
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use crate::{catalog::MockCatalogResolver, products::ProductCode};

    use super::*;

    fn kiosk() -> Kiosk {
        Kiosk::new(Arc::new(MockCatalogResolver::new()), USD)
    }

    fn product(code: &str, name: &str, minor: i64) -> Product {
        Product {
            code: ProductCode::trimmed(code),
            name: name.to_string(),
            price: Money::from_minor(minor, USD),
        }
    }

    fn lookup(kiosk: &Kiosk, raw: &str) -> Result<LookupRequest, io::Error> {
        kiosk
            .request_code(raw)
            .ok_or_else(|| io::Error::other("blank input was refused"))
    }

    fn add_line(kiosk: &mut Kiosk, code: &str, name: &str, minor: i64) -> TestResult {
        let request = lookup(kiosk, code)?;

        _ = kiosk.complete_lookup(&request, Some(product(code, name, minor)))?;

        Ok(())
    }

    #[test]
    fn blank_input_requests_nothing() {
        let kiosk = kiosk();

        assert!(kiosk.request_code("").is_none());
        assert!(kiosk.request_code("   ").is_none());
    }

    #[test]
    fn request_code_trims_and_stamps_the_input() -> TestResult {
        let kiosk = kiosk();

        let request = lookup(&kiosk, "  1001a  ")?;

        assert_eq!(request.input(), "1001a");
        assert_eq!(request.txn(), kiosk.txn());

        Ok(())
    }

    #[test]
    fn found_products_are_appended_in_order() -> TestResult {
        let mut kiosk = kiosk();

        add_line(&mut kiosk, "1001", "Leche descremada", 300)?;
        add_line(&mut kiosk, "1002", "Manzana Fiji", 60)?;

        assert_eq!(kiosk.cart().len(), 2);
        assert_eq!(
            kiosk.cart().get(1).map(|line| line.name().to_string()),
            Some("Manzana Fiji".to_string()),
        );

        Ok(())
    }

    #[test]
    fn a_missing_product_changes_nothing() -> TestResult {
        let mut kiosk = kiosk();

        add_line(&mut kiosk, "1001", "Leche descremada", 300)?;

        let request = lookup(&kiosk, "9999")?;
        let outcome = kiosk.complete_lookup(&request, None)?;

        assert_eq!(
            outcome,
            CodeOutcome::NotFound {
                input: "9999".to_string()
            }
        );
        assert_eq!(kiosk.cart().len(), 1);

        Ok(())
    }

    #[test]
    fn lookups_from_before_a_reset_are_dropped() -> TestResult {
        let mut kiosk = kiosk();

        let request = lookup(&kiosk, "1001")?;

        kiosk.reset();

        let outcome =
            kiosk.complete_lookup(&request, Some(product("1001", "Leche descremada", 300)))?;

        assert_eq!(outcome, CodeOutcome::Stale);
        assert!(kiosk.cart().is_empty());

        Ok(())
    }

    #[test]
    fn totals_derive_from_the_cart() -> TestResult {
        let mut kiosk = kiosk();

        add_line(&mut kiosk, "1001", "Leche descremada", 300)?;
        add_line(&mut kiosk, "1002", "Manzana Fiji", 60)?;

        let totals = kiosk.totals()?;

        assert_eq!(totals.subtotal(), Money::from_minor(360, USD));
        assert_eq!(totals.discount(), Money::from_minor(72, USD));
        assert_eq!(totals.total(), Money::from_minor(288, USD));

        Ok(())
    }

    #[test]
    fn removing_an_absent_line_is_a_no_op() -> TestResult {
        let mut kiosk = kiosk();

        add_line(&mut kiosk, "1001", "Leche descremada", 300)?;

        assert!(kiosk.remove_line(7).is_none());
        assert_eq!(kiosk.cart().len(), 1);

        Ok(())
    }

    #[test]
    fn starting_a_payment_opens_the_pending_overlay() {
        let mut kiosk = kiosk();
        kiosk.begin_checkout();

        let ticket = kiosk.begin_payment(PaymentMethod::Cash);

        assert!(kiosk.navigator().is_open(Modal::CashPending));
        assert!(!kiosk.navigator().is_open(Modal::ThankYou));
        assert_eq!(ticket.txn(), kiosk.txn());
    }

    #[test]
    fn settling_swaps_pending_for_thank_you() {
        let mut kiosk = kiosk();
        kiosk.begin_checkout();

        let ticket = kiosk.begin_payment(PaymentMethod::Card);
        let outcome = kiosk.settle_payment(ticket);

        assert_eq!(outcome, PaymentOutcome::Settled);
        assert!(!kiosk.navigator().is_open(Modal::CardPending));
        assert!(kiosk.navigator().is_open(Modal::ThankYou));
    }

    #[test]
    fn settlements_from_before_a_reset_are_refused() {
        let mut kiosk = kiosk();
        kiosk.begin_checkout();

        let ticket = kiosk.begin_payment(PaymentMethod::Cash);

        kiosk.reset();

        let outcome = kiosk.settle_payment(ticket);

        assert_eq!(outcome, PaymentOutcome::Stale);
        assert!(!kiosk.navigator().any_open());
        assert_eq!(kiosk.screen(), Screen::Welcome);
    }

    #[test]
    fn reset_returns_the_till_to_idle() -> TestResult {
        let mut kiosk = kiosk();
        kiosk.begin_checkout();

        add_line(&mut kiosk, "1001", "Leche descremada", 300)?;
        add_line(&mut kiosk, "1002", "Manzana Fiji", 60)?;
        kiosk.show_credit_info();

        let old_txn = kiosk.txn();
        let old_token = kiosk.txn_token();

        kiosk.reset();

        assert!(kiosk.cart().is_empty());
        assert_eq!(kiosk.totals()?.total(), Money::from_minor(0, USD));
        assert_eq!(kiosk.screen(), Screen::Welcome);
        assert!(!kiosk.navigator().any_open());
        assert_ne!(kiosk.txn(), old_txn);
        assert!(old_token.is_cancelled());
        assert!(!kiosk.txn_token().is_cancelled());

        Ok(())
    }

    #[test]
    fn billing_form_submission_lands_on_checkout() {
        let mut kiosk = kiosk();

        kiosk.open_billing_form();
        assert_eq!(kiosk.screen(), Screen::BillingForm);

        kiosk.submit_billing(&BillingDetails::new("Ana Morales", "0801"));

        assert_eq!(kiosk.screen(), Screen::Checkout);
    }

    #[test]
    fn escape_closes_every_overlay() {
        let mut kiosk = kiosk();

        kiosk.show_credit_info();
        _ = kiosk.begin_payment(PaymentMethod::Cash);

        kiosk.escape();

        assert!(!kiosk.navigator().any_open());
    }

    #[test]
    fn close_modal_targets_one_overlay_or_all() {
        let mut kiosk = kiosk();

        kiosk.show_credit_info();
        _ = kiosk.begin_payment(PaymentMethod::Cash);

        kiosk.close_modal(Some(Modal::CreditInfo));

        assert!(!kiosk.navigator().is_open(Modal::CreditInfo));
        assert!(kiosk.navigator().is_open(Modal::CashPending));

        kiosk.close_modal(None);

        assert!(!kiosk.navigator().any_open());
    }
}
