//! Screens
//!
//! Navigation state for the till: exactly one full-view screen is active at a
//! time, with any number of modal overlays layered above it.

use rustc_hash::FxHashSet;

/// Full-view screens. Activating one deactivates the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Idle screen shown between sales.
    #[default]
    Welcome,

    /// Scanning screen with the cart listing and totals.
    Checkout,

    /// Billing details form reached from the welcome screen.
    BillingForm,
}

/// Modal overlays. Each opens and closes independently of the others and of
/// the active screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modal {
    /// Informational overlay about paying in installments.
    CreditInfo,

    /// Shown while a cash payment is settling.
    CashPending,

    /// Shown while a card payment is settling.
    CardPending,

    /// Shown once a payment has settled.
    ThankYou,
}

impl Modal {
    /// Every overlay, in render order.
    pub const ALL: [Self; 4] = [
        Self::CreditInfo,
        Self::CashPending,
        Self::CardPending,
        Self::ThankYou,
    ];

    /// Short name used to address this overlay from the prompt.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::CreditInfo => "credit",
            Self::CashPending => "cash",
            Self::CardPending => "card",
            Self::ThankYou => "thanks",
        }
    }

    /// Resolves a prompt token back to an overlay.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|modal| modal.slug() == slug)
    }
}

/// Tracks the active screen and the set of open overlays.
#[derive(Debug, Default)]
pub struct Navigator {
    screen: Screen,
    open: FxHashSet<Modal>,
}

impl Navigator {
    /// Starts on the welcome screen with no overlays open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently active screen.
    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Activates `screen`, deactivating whichever was active before.
    pub fn goto(&mut self, screen: Screen) {
        self.screen = screen;
    }

    /// Opens an overlay. Opening an already-open overlay changes nothing.
    pub fn show(&mut self, modal: Modal) {
        _ = self.open.insert(modal);
    }

    /// Closes an overlay, returning whether it had been open.
    pub fn hide(&mut self, modal: Modal) -> bool {
        self.open.remove(&modal)
    }

    /// Closes every open overlay.
    pub fn hide_all(&mut self) {
        self.open.clear();
    }

    /// Returns `true` when `modal` is open.
    #[must_use]
    pub fn is_open(&self, modal: Modal) -> bool {
        self.open.contains(&modal)
    }

    /// Returns `true` when at least one overlay is open.
    #[must_use]
    pub fn any_open(&self) -> bool {
        !self.open.is_empty()
    }

    /// Iterates over open overlays in render order.
    pub fn open_modals(&self) -> impl Iterator<Item = Modal> + '_ {
        Modal::ALL
            .into_iter()
            .filter(|modal| self.open.contains(modal))
    }
}
