//! Till prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    billing::BillingDetails,
    cart::{Cart, CartError, CartLine},
    catalog::{
        CatalogResolver,
        fixed::{CatalogError, FixedCatalog},
        remote::{RemoteCatalog, RemoteCatalogConfig, RemoteCatalogError},
    },
    commands::{Command, parse},
    kiosk::{CodeOutcome, Kiosk, LookupRequest, TxnId},
    payment::{PaymentMethod, PaymentOutcome, PaymentTicket, SETTLE_DELAY, settle_after_delay},
    products::{Price, Product, ProductCode},
    render::{RenderError, draw},
    screens::{Modal, Navigator, Screen},
    totals::{Totals, TotalsError, discount_rate},
};
