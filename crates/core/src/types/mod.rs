//! Core types for ShopWave.
//!
//! This module provides type-safe wrappers for common domain concepts and
//! the records exchanged with the data service.

pub mod catalog;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod status;

pub use catalog::{Category, NewCategory, NewProduct, Product};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{NewOrder, NewOrderLine, Order, OrderLine};
pub use price::{Price, PriceError};
pub use status::OrderStatus;
