//! ShopWave Core - Shared types library.
//!
//! This crate provides the record types used across all ShopWave components:
//! - `storefront` - Catalog, cart and checkout library
//! - `cli` - Command-line driver for browsing, cart management and checkout
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no session
//! state. Records mirror the managed data service schema (`Product`,
//! `Category`, `Order`, `OrderItem`) so they serialize directly to and from
//! the wire.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices, statuses, emails and the catalog/order records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
