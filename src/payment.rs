//! Payment simulation
//!
//! Payments are pretend: starting one opens the matching pending overlay and
//! schedules a settlement after a fixed delay. The scheduled task is tied to
//! the transaction that started it, so resetting the till cancels the wait
//! and any ticket that still slips through is refused on arrival.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{kiosk::TxnId, screens::Modal};

/// Delay between starting a simulated payment and its settlement.
pub const SETTLE_DELAY: Duration = Duration::from_millis(2000);

/// Tender accepted by the till.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    /// Settled at the attached cash acceptor.
    Cash,

    /// Settled at the attached card terminal.
    Card,
}

impl PaymentMethod {
    /// Overlay shown while this method is settling.
    #[must_use]
    pub fn pending_modal(self) -> Modal {
        match self {
            Self::Cash => Modal::CashPending,
            Self::Card => Modal::CardPending,
        }
    }

    /// Lowercase label for prompts and logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
        }
    }
}

/// Handle for one scheduled settlement, stamped with the transaction that
/// started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentTicket {
    txn: TxnId,
    method: PaymentMethod,
    opened_at: Instant,
}

impl PaymentTicket {
    pub(crate) fn new(txn: TxnId, method: PaymentMethod) -> Self {
        Self {
            txn,
            method,
            opened_at: Instant::now(),
        }
    }

    /// Transaction the payment was started under.
    #[must_use]
    pub fn txn(&self) -> TxnId {
        self.txn
    }

    /// Tender being settled.
    #[must_use]
    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    /// When the payment was started.
    #[must_use]
    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }
}

/// Outcome of handing a settled ticket back to the till.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The pending overlay was replaced with the thank-you overlay.
    Settled,

    /// The ticket belongs to an earlier transaction and was dropped.
    Stale,
}

/// Waits out the settlement delay, then hands the ticket back through
/// `settled`.
///
/// Cancelling `cancel` (which the till does on reset) abandons the wait, so
/// most stale tickets are never delivered at all. Any that still race through
/// are refused by [`Kiosk::settle_payment`](crate::kiosk::Kiosk::settle_payment).
pub async fn settle_after_delay(
    ticket: PaymentTicket,
    delay: Duration,
    cancel: CancellationToken,
    settled: mpsc::Sender<PaymentTicket>,
) {
    tokio::select! {
        () = cancel.cancelled() => {
            tracing::debug!(
                method = ticket.method().label(),
                txn = %ticket.txn(),
                "settlement cancelled before completion"
            );
        }
        () = tokio::time::sleep(delay) => {
            if settled.send(ticket).await.is_err() {
                tracing::debug!("settlement receiver dropped before delivery");
            }
        }
    }
}
