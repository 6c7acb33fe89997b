//! Till terminal binary.

use std::{
    io::{self, Write},
    path::PathBuf,
    process,
    sync::Arc,
    time::Duration,
};

use clap::{Parser, ValueEnum};
use humanize_duration::{Truncate, prelude::DurationExt};
use rusty_money::iso::Currency;
use thiserror::Error;
use tokio::{io::AsyncBufReadExt, sync::mpsc};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use till::{
    billing::BillingDetails,
    catalog::{
        CatalogResolver,
        fixed::{self, FixedCatalog},
        remote::{RemoteCatalog, RemoteCatalogConfig, RemoteCatalogError},
    },
    commands::{self, Command},
    kiosk::{CodeOutcome, Kiosk, LookupRequest},
    payment::{self, PaymentOutcome, PaymentTicket},
    products::Product,
    render,
    screens::Screen,
};

/// Till simulator configuration
#[derive(Debug, Parser)]
#[command(name = "till", about = "Self-checkout till simulator", long_about = None)]
pub struct Config {
    /// Catalog strategy for resolving product codes
    #[arg(long, env = "TILL_CATALOG", value_enum, default_value = "fixed")]
    pub catalog: CatalogKind,

    /// Catalog YAML file overriding the built-in table (fixed catalog only)
    #[arg(long, env = "TILL_CATALOG_FILE")]
    pub catalog_file: Option<PathBuf>,

    /// Base URL of the remote product endpoint (remote catalog only)
    #[arg(
        long,
        env = "TILL_REMOTE_URL",
        default_value = "https://dummyjson.com/products"
    )]
    pub remote_url: String,

    /// Remote lookup timeout in milliseconds (remote catalog only)
    #[arg(long, env = "TILL_LOOKUP_TIMEOUT_MS", default_value = "4000")]
    pub lookup_timeout_ms: u64,

    /// Delay before a simulated payment settles, in milliseconds
    #[arg(long, env = "TILL_SETTLE_DELAY_MS", default_value = "2000")]
    pub settle_delay_ms: u64,

    /// Currency remote prices are quoted in (fixed catalogs carry their own)
    #[arg(long, env = "TILL_CURRENCY", default_value = "USD")]
    pub currency: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

/// Which catalog strategy resolves codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogKind {
    /// Built-in (or file-provided) code table
    Fixed,

    /// Remote HTTP product endpoint
    Remote,
}

/// Errors that end the till session.
#[derive(Debug, Error)]
enum TillError {
    /// Catalog table could not be loaded.
    #[error(transparent)]
    Catalog(#[from] fixed::CatalogError),

    /// Remote catalog client could not be built.
    #[error(transparent)]
    RemoteCatalog(#[from] RemoteCatalogError),

    /// The display could not be drawn.
    #[error(transparent)]
    Render(#[from] render::RenderError),

    /// IO error on the prompt streams.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Till entry point
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = Config::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    if let Err(error) = run(config).await {
        error!("till stopped: {error}");

        process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), TillError> {
    let settle_delay = Duration::from_millis(config.settle_delay_ms);

    let (catalog, currency): (Arc<dyn CatalogResolver>, &'static Currency) = match config.catalog {
        CatalogKind::Fixed => {
            let table = match &config.catalog_file {
                Some(path) => FixedCatalog::from_path(path)?,
                None => FixedCatalog::builtin()?,
            };
            let currency = table.currency();

            info!(
                entries = table.len(),
                currency = currency.iso_alpha_code,
                "resolving codes against the fixed catalog"
            );

            (Arc::new(table), currency)
        }
        CatalogKind::Remote => {
            let currency = fixed::parse_currency(&config.currency)?;
            let remote = RemoteCatalog::new(RemoteCatalogConfig {
                base_url: config.remote_url.clone(),
                timeout: Duration::from_millis(config.lookup_timeout_ms),
                currency,
            })?;

            info!(
                base_url = %config.remote_url,
                "resolving codes against the remote catalog"
            );

            (Arc::new(remote), currency)
        }
    };

    let kiosk = Kiosk::with_settle_delay(catalog, currency, settle_delay);

    run_session(kiosk).await
}

/// Flow control for the prompt loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Drives the till from stdin until `quit` or end of input.
///
/// The loop multiplexes three event sources: typed lines, resolved catalog
/// lookups, and settled payments. The till state is redrawn after every
/// event, never patched in place.
async fn run_session(mut kiosk: Kiosk) -> Result<(), TillError> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut out = io::stdout();

    let (lookup_tx, mut lookup_rx) = mpsc::channel::<(LookupRequest, Option<Product>)>(8);
    let (settle_tx, mut settle_rx) = mpsc::channel::<PaymentTicket>(8);

    let mut awaiting_cancel_confirm = false;

    render::draw(&mut out, &kiosk)?;
    write_prompt(&mut out, &kiosk, awaiting_cancel_confirm)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };

                let flow = handle_line(
                    &mut kiosk,
                    &mut out,
                    &line,
                    &mut awaiting_cancel_confirm,
                    &lookup_tx,
                    &settle_tx,
                )?;

                if flow == Flow::Quit {
                    break;
                }
            }
            Some((request, found)) = lookup_rx.recv() => {
                apply_lookup(&mut kiosk, &mut out, &request, found)?;
            }
            Some(ticket) = settle_rx.recv() => {
                apply_settlement(&mut kiosk, &mut out, ticket)?;
            }
        }

        render::draw(&mut out, &kiosk)?;
        write_prompt(&mut out, &kiosk, awaiting_cancel_confirm)?;
    }

    Ok(())
}

fn handle_line(
    kiosk: &mut Kiosk,
    out: &mut impl Write,
    line: &str,
    awaiting_cancel_confirm: &mut bool,
    lookup_tx: &mpsc::Sender<(LookupRequest, Option<Product>)>,
    settle_tx: &mpsc::Sender<PaymentTicket>,
) -> Result<Flow, TillError> {
    let command = commands::parse(line);

    if *awaiting_cancel_confirm {
        match command {
            Command::Yes => {
                *awaiting_cancel_confirm = false;
                kiosk.reset();
                status(out, "Sale cancelled.")?;
            }
            Command::No => {
                *awaiting_cancel_confirm = false;
                status(out, "Resuming the sale.")?;
            }
            _ => status(out, "Reply y or n.")?,
        }

        return Ok(Flow::Continue);
    }

    match command {
        Command::Begin => match kiosk.screen() {
            Screen::Welcome => kiosk.begin_checkout(),
            Screen::Checkout | Screen::BillingForm => status(out, "Already in a sale.")?,
        },
        Command::Invoice => match kiosk.screen() {
            Screen::Welcome => kiosk.open_billing_form(),
            Screen::Checkout | Screen::BillingForm => {
                status(out, "Billing details are offered on the welcome screen.")?;
            }
        },
        Command::CreditInfo => match kiosk.screen() {
            Screen::Welcome => kiosk.show_credit_info(),
            Screen::Checkout | Screen::BillingForm => {
                status(out, "Credit information is offered on the welcome screen.")?;
            }
        },
        Command::Pay(method) => match kiosk.screen() {
            Screen::Checkout => {
                let ticket = kiosk.begin_payment(method);

                _ = tokio::spawn(payment::settle_after_delay(
                    ticket,
                    kiosk.settle_delay(),
                    kiosk.txn_token(),
                    settle_tx.clone(),
                ));
            }
            Screen::Welcome | Screen::BillingForm => status(out, "Start a sale before paying.")?,
        },
        Command::Remove(position) => match kiosk.screen() {
            Screen::Checkout => match kiosk.remove_line(position - 1) {
                Some(removed) => status(out, &format!("Removed {}.", removed.name()))?,
                None => status(out, &format!("No line #{position}."))?,
            },
            Screen::Welcome | Screen::BillingForm => status(out, "Nothing to remove here.")?,
        },
        Command::Cancel => match kiosk.screen() {
            Screen::Checkout => *awaiting_cancel_confirm = true,
            Screen::Welcome | Screen::BillingForm => status(out, "No sale to cancel.")?,
        },
        Command::Yes | Command::No => status(out, "Nothing to confirm right now.")?,
        Command::Escape => kiosk.escape(),
        Command::Close(target) => kiosk.close_modal(target),
        Command::Help => write_help(out)?,
        Command::Quit => return Ok(Flow::Quit),
        Command::Entry(text) => handle_entry(kiosk, out, &text, lookup_tx)?,
    }

    Ok(Flow::Continue)
}

fn handle_entry(
    kiosk: &mut Kiosk,
    out: &mut impl Write,
    text: &str,
    lookup_tx: &mpsc::Sender<(LookupRequest, Option<Product>)>,
) -> Result<(), TillError> {
    match kiosk.screen() {
        Screen::Checkout => {
            if let Some(request) = kiosk.request_code(text) {
                let catalog = kiosk.catalog();
                let tx = lookup_tx.clone();

                _ = tokio::spawn(async move {
                    let found = catalog.resolve(request.input()).await;

                    if tx.send((request, found)).await.is_err() {
                        debug!("lookup receiver dropped before delivery");
                    }
                });
            }
        }
        Screen::BillingForm => kiosk.submit_billing(&BillingDetails::from_line(text)),
        Screen::Welcome => {
            if !text.is_empty() {
                status(out, "Type help for the available commands.")?;
            }
        }
    }

    Ok(())
}

fn apply_lookup(
    kiosk: &mut Kiosk,
    out: &mut impl Write,
    request: &LookupRequest,
    found: Option<Product>,
) -> Result<(), TillError> {
    match kiosk.complete_lookup(request, found) {
        Ok(CodeOutcome::Added { index }) => {
            if let Some(line) = kiosk.cart().get(index) {
                status(out, &format!("Added {} ({}).", line.name(), line.price()))?;
            }
        }
        Ok(CodeOutcome::NotFound { input }) => {
            status(out, &format!("Code not found: {input}"))?;
        }
        Ok(CodeOutcome::Stale) => {}
        Err(error) => status(out, &format!("Could not add the item: {error}"))?,
    }

    Ok(())
}

fn apply_settlement(
    kiosk: &mut Kiosk,
    out: &mut impl Write,
    ticket: PaymentTicket,
) -> Result<(), TillError> {
    if kiosk.settle_payment(ticket) == PaymentOutcome::Settled {
        let took = ticket.opened_at().elapsed();

        status(
            out,
            &format!(
                "Payment approved ({}) after {}.",
                ticket.method().label(),
                took.human(Truncate::Millis)
            ),
        )?;
    }

    Ok(())
}

/// One-line status note between draws.
fn status(out: &mut impl Write, message: &str) -> Result<(), TillError> {
    writeln!(out, "\x1b[33m{message}\x1b[0m")?;

    Ok(())
}

fn write_prompt(
    out: &mut impl Write,
    kiosk: &Kiosk,
    awaiting_cancel_confirm: bool,
) -> Result<(), TillError> {
    let prompt = if awaiting_cancel_confirm {
        "cancel the sale? (y/n)> "
    } else {
        match kiosk.screen() {
            Screen::Welcome => "till> ",
            Screen::Checkout => "code> ",
            Screen::BillingForm => "billing> ",
        }
    };

    write!(out, "{prompt}")?;
    out.flush()?;

    Ok(())
}

fn write_help(out: &mut impl Write) -> Result<(), TillError> {
    let help = "\
Commands:
  start           begin a sale
  invoice         enter billing details for a receipt
  credit          show installment information
  <code>          add a product while checking out (e.g. 1001)
  del N           remove cart line N
  cash | card     pay the discounted total
  cancel          abandon the sale (asks y/n)
  close [name]    close one overlay (credit, cash, card, thanks) or all
  esc             close every overlay
  quit            leave the till";

    writeln!(out, "{help}")?;

    Ok(())
}
