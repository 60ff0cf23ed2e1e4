use rust_decimal::Decimal;
use serde::Serialize;

use shopwave_core::Price;

use super::{CartLine, CartPersistence, CartStore};

/// Cart page totals. Shipping is always free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub subtotal: Price,
    pub shipping: Price,
    /// Subtotal times the tax rate, rounded to cents.
    pub tax: Price,
    pub total: Price,
}

impl OrderSummary {
    /// Summarize a cart at the given tax rate (e.g. `0.10`).
    #[must_use]
    pub fn from_cart<P: CartPersistence>(cart: &CartStore<P>, tax_rate: Decimal) -> Self {
        Self::from_lines(cart.lines(), tax_rate)
    }

    /// Summarize a line set at the given tax rate.
    #[must_use]
    pub fn from_lines(lines: &[CartLine], tax_rate: Decimal) -> Self {
        let subtotal: Price = lines.iter().map(CartLine::line_total).sum();
        let shipping = Price::ZERO;
        let tax = subtotal.apply_rate(tax_rate);
        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }
}
