//! Commands
//!
//! Parser for the till prompt. Lines that match a command word are commands;
//! everything else is an entry whose meaning depends on the active screen (a
//! product code while checking out, a form line on the billing screen).

use crate::{payment::PaymentMethod, screens::Modal};

/// One parsed line of prompt input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Jump from the welcome screen to checkout.
    Begin,

    /// Open the billing details form.
    Invoice,

    /// Show the installment information overlay.
    CreditInfo,

    /// Remove the cart line at this 1-based position.
    Remove(usize),

    /// Start a simulated payment.
    Pay(PaymentMethod),

    /// Ask to cancel the sale. A confirmation reply follows.
    Cancel,

    /// Affirmative confirmation reply.
    Yes,

    /// Negative confirmation reply.
    No,

    /// Close every overlay, as the escape key does.
    Escape,

    /// Close one overlay, or every overlay when untargeted.
    Close(Option<Modal>),

    /// Show the command summary.
    Help,

    /// Leave the till.
    Quit,

    /// Anything else, taken as screen-dependent input.
    Entry(String),
}

/// Parses one line of prompt input.
///
/// Command words are matched case-insensitively on the first token. A `del`
/// without a usable position falls through to [`Command::Entry`] so the line
/// is surfaced rather than silently mangled.
#[must_use]
pub fn parse(line: &str) -> Command {
    let trimmed = line.trim();
    let mut words = trimmed.split_whitespace();
    let head = words.next().unwrap_or_default().to_ascii_lowercase();

    match head.as_str() {
        "start" | "begin" => Command::Begin,
        "invoice" | "bill" => Command::Invoice,
        "credit" => Command::CreditInfo,
        "cash" => Command::Pay(PaymentMethod::Cash),
        "card" => Command::Pay(PaymentMethod::Card),
        "cancel" => Command::Cancel,
        "y" | "yes" => Command::Yes,
        "n" | "no" => Command::No,
        "esc" | "escape" => Command::Escape,
        "close" => Command::Close(words.next().and_then(Modal::from_slug)),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "del" | "rm" | "remove" => match words.next().and_then(|n| n.parse::<usize>().ok()) {
            Some(position) if position >= 1 => Command::Remove(position),
            _ => Command::Entry(trimmed.to_string()),
        },
        _ => Command::Entry(trimmed.to_string()),
    }
}
