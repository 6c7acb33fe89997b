//! Till
//!
//! Till is a self-checkout till simulator: a catalog-backed cart with derived
//! totals, screen and overlay navigation, and simulated cash or card
//! settlement, driven from a terminal prompt.

pub mod billing;
pub mod cart;
pub mod catalog;
pub mod commands;
pub mod kiosk;
pub mod payment;
pub mod prelude;
pub mod products;
pub mod render;
pub mod screens;
pub mod totals;
