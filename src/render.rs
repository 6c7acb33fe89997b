//! Rendering
//!
//! One-way projection of kiosk state onto a terminal. Nothing here is read
//! back: the cart and navigator are the source of truth, and every draw
//! derives the whole display from them again.

use std::{fmt::Write, io};

use decimal_percentage::Percentage;
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use smallvec::{SmallVec, smallvec};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::Cart,
    kiosk::Kiosk,
    screens::{Modal, Screen},
    totals::{Totals, TotalsError},
};

/// Errors that can occur while drawing the till.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Totals could not be derived from the cart.
    #[error(transparent)]
    Totals(#[from] TotalsError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Draws the whole till: the active screen, then any open overlays, then a
/// short hint naming the commands that make sense right now.
///
/// # Errors
///
/// Returns a [`RenderError`] if totals cannot be derived or the output
/// cannot be written.
pub fn draw(out: &mut impl io::Write, kiosk: &Kiosk) -> Result<(), RenderError> {
    match kiosk.screen() {
        Screen::Welcome => write_welcome(out)?,
        Screen::Checkout => write_checkout(out, kiosk)?,
        Screen::BillingForm => write_billing_form(out)?,
    }

    for modal in kiosk.navigator().open_modals() {
        write_modal(out, modal)?;
    }

    write_hint(out, kiosk.screen())
}

fn write_welcome(out: &mut impl io::Write) -> Result<(), RenderError> {
    writeln!(out, "\n \x1b[1mSELF-CHECKOUT\x1b[0m").map_err(|_err| RenderError::IO)?;
    writeln!(out, " Welcome. Scan as you go.").map_err(|_err| RenderError::IO)
}

fn write_billing_form(out: &mut impl io::Write) -> Result<(), RenderError> {
    writeln!(out, "\n \x1b[1mBILLING DETAILS\x1b[0m").map_err(|_err| RenderError::IO)?;
    writeln!(out, " Nothing is checked or stored; the details go on this receipt only.")
        .map_err(|_err| RenderError::IO)
}

fn write_checkout(out: &mut impl io::Write, kiosk: &Kiosk) -> Result<(), RenderError> {
    let totals = kiosk.totals()?;

    write_cart_table(out, kiosk.cart())?;
    write_totals_summary(out, &totals)
}

fn write_cart_table(out: &mut impl io::Write, cart: &Cart) -> Result<(), RenderError> {
    let mut builder = Builder::default();

    builder.push_record(["#", "Code", "Item", "Price"]);

    let mut color_ops: SmallVec<[(usize, usize, Color); 32]> = smallvec![];

    for (idx, line) in cart.iter().enumerate() {
        builder.push_record([
            format!("#{:<3}", idx + 1),
            line.code().to_string(),
            line.name().to_string(),
            format!("{}", line.price()),
        ]);

        color_ops.push((idx + 1, 1, color_dark_grey()));
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..4), Alignment::right());

    for (row, col, color) in color_ops {
        table.modify((row, col), color);
    }

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| RenderError::IO)
}

fn write_totals_summary(out: &mut impl io::Write, totals: &Totals) -> Result<(), RenderError> {
    let discount_points = percent_points(totals.rate());

    let subtotal_label = " Subtotal:";
    let discount_label = format!(" Discount ({discount_points}%):");
    let total_label = " \x1b[1mTotal:\x1b[0m";

    let subtotal_val = format!("{}  ", totals.subtotal());
    let discount_val = format!("-{}  ", totals.discount());
    let total_val = format!("{}  ", totals.total());

    let label_width = visible_width(subtotal_label)
        .max(visible_width(&discount_label))
        .max(visible_width(total_label));

    let value_width = subtotal_val
        .len()
        .max(discount_val.len())
        .max(total_val.len());

    write_summary_line(out, subtotal_label, &subtotal_val, label_width, value_width)?;
    write_summary_line(out, &discount_label, &discount_val, label_width, value_width)?;

    write_summary_line(
        out,
        total_label,
        &format!("\x1b[1m{total_val}\x1b[0m"),
        label_width,
        value_width,
    )?;

    writeln!(out).map_err(|_err| RenderError::IO)
}

/// Copy shown inside each overlay box.
fn modal_copy(modal: Modal) -> (&'static str, &'static str) {
    match modal {
        Modal::CreditInfo => (
            "CREDIT",
            "Pay in up to 12 installments with participating cards.",
        ),
        Modal::CashPending => ("CASH PAYMENT", "Processing your cash payment, please wait."),
        Modal::CardPending => ("CARD PAYMENT", "Processing your card payment, please wait."),
        Modal::ThankYou => ("THANK YOU", "Payment received. Take your receipt."),
    }
}

fn write_modal(out: &mut impl io::Write, modal: Modal) -> Result<(), RenderError> {
    let (title, body) = modal_copy(modal);

    let interior = visible_width(title).max(visible_width(body)) + 2;
    let horizontal = "─".repeat(interior);

    let bold_title = format!("\x1b[1m{title}\x1b[0m");

    let lines = [
        format!("╭{horizontal}╮"),
        boxed_line(&bold_title, interior),
        format!("├{horizontal}┤"),
        boxed_line(body, interior),
        format!("╰{horizontal}╯"),
    ];

    for line in lines {
        writeln!(out, "{}", colorize_borders(&line)).map_err(|_err| RenderError::IO)?;
    }

    Ok(())
}

/// One interior box row, left-padded by a single space.
fn boxed_line(text: &str, interior: usize) -> String {
    let pad = interior.saturating_sub(visible_width(text) + 1);

    format!("│ {text}{}│", " ".repeat(pad))
}

fn write_hint(out: &mut impl io::Write, screen: Screen) -> Result<(), RenderError> {
    let hint = match screen {
        Screen::Welcome => "start | invoice | credit | help | quit",
        Screen::Checkout => "<code> | del N | cash | card | cancel | help",
        Screen::BillingForm => "type name ; tax id and press enter",
    };

    writeln!(out, "\x1b[90m{hint}\x1b[0m").map_err(|_err| RenderError::IO)
}

/// Converts a fractional rate to percent points for display.
fn percent_points(rate: Percentage) -> Decimal {
    // `Percentage` is a fraction (e.g. 0.2), so multiply by 100 to print percent points.
    ((rate * Decimal::ONE) * Decimal::from_i64(100).unwrap_or(Decimal::ZERO)).round_dp(0)
}

/// Wraps runs of UTF-8 box-drawing characters in ANSI dark-grey escape codes.
///
/// Box-drawing characters occupy the Unicode range U+2500..U+257F. This function
/// scans each character, grouping consecutive border characters and emitting a
/// single grey escape sequence around each run, leaving cell content untouched.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), RenderError> {
    let label_vis = visible_width(label);
    let value_vis = visible_width(value);

    // 2 chars of spacing between label and value column.
    let label_pad = label_col_width.saturating_sub(label_vis);
    let value_pad = value_col_width.saturating_sub(value_vis);

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| RenderError::IO)
}

/// ANSI dark grey foreground.
fn color_dark_grey() -> Color {
    Color::new("\x1b[90m", "\x1b[0m")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use crate::{
        cart::CartError,
        catalog::MockCatalogResolver,
        payment::PaymentMethod,
        products::{Product, ProductCode},
    };

    use super::*;

    fn kiosk_with_lines(lines: &[(&str, &str, i64)]) -> Result<Kiosk, CartError> {
        let mut kiosk = Kiosk::new(Arc::new(MockCatalogResolver::new()), USD);

        kiosk.begin_checkout();

        for &(code, name, minor) in lines {
            if let Some(request) = kiosk.request_code(code) {
                _ = kiosk.complete_lookup(
                    &request,
                    Some(Product {
                        code: ProductCode::trimmed(code),
                        name: name.to_string(),
                        price: Money::from_minor(minor, USD),
                    }),
                )?;
            }
        }

        Ok(kiosk)
    }

    fn rendered(kiosk: &Kiosk) -> Result<String, io::Error> {
        let mut buf = Vec::new();

        draw(&mut buf, kiosk).map_err(io::Error::other)?;

        String::from_utf8(buf).map_err(io::Error::other)
    }

    #[test]
    fn welcome_screen_names_the_entry_commands() -> TestResult {
        let kiosk = Kiosk::new(Arc::new(MockCatalogResolver::new()), USD);

        let output = rendered(&kiosk)?;

        assert!(output.contains("SELF-CHECKOUT"));
        assert!(output.contains("start"));
        assert!(output.contains("invoice"));

        Ok(())
    }

    #[test]
    fn checkout_screen_lists_lines_and_derived_totals() -> TestResult {
        let kiosk = kiosk_with_lines(&[
            ("1001", "Leche descremada", 300),
            ("1002", "Manzana Fiji", 60),
        ])?;

        let output = rendered(&kiosk)?;

        assert!(output.contains("Leche descremada"));
        assert!(output.contains("Manzana Fiji"));
        assert!(output.contains("$3.60"));
        assert!(output.contains("Discount (20%)"));
        assert!(output.contains("-$0.72"));
        assert!(output.contains("$2.88"));

        Ok(())
    }

    #[test]
    fn an_empty_checkout_still_shows_zero_totals() -> TestResult {
        let kiosk = kiosk_with_lines(&[])?;

        let output = rendered(&kiosk)?;

        assert!(output.contains("Subtotal:"));
        assert!(output.contains("$0.00"));

        Ok(())
    }

    #[test]
    fn open_overlays_are_drawn_above_the_screen() -> TestResult {
        let mut kiosk = kiosk_with_lines(&[("1001", "Leche descremada", 300)])?;

        let ticket = kiosk.begin_payment(PaymentMethod::Cash);
        let output = rendered(&kiosk)?;

        assert!(output.contains("CASH PAYMENT"));
        assert!(!output.contains("THANK YOU"));

        _ = kiosk.settle_payment(ticket);
        let output = rendered(&kiosk)?;

        assert!(!output.contains("CASH PAYMENT"));
        assert!(output.contains("THANK YOU"));

        Ok(())
    }

    #[test]
    fn drawing_is_a_pure_projection() -> TestResult {
        let kiosk = kiosk_with_lines(&[("1001", "Leche descremada", 300)])?;

        let first = rendered(&kiosk)?;
        let second = rendered(&kiosk)?;

        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    fn billing_form_screen_shows_its_instructions() -> TestResult {
        let mut kiosk = Kiosk::new(Arc::new(MockCatalogResolver::new()), USD);

        kiosk.open_billing_form();

        let output = rendered(&kiosk)?;

        assert!(output.contains("BILLING DETAILS"));

        Ok(())
    }
}
