//! ShopWave storefront library.
//!
//! Catalog reads, the session cart and order submission against the managed
//! data service. The `shopwave` CLI and the integration tests drive it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod data;
pub mod error;
pub mod seed;
pub mod services;
