//! Client-side shopping cart.
//!
//! A [`CartStore`] owns the line set for one session. Lines keep a snapshot
//! of the product taken when it was last added, so totals use the price the
//! shopper saw. Every mutation writes the full line set through a
//! [`CartPersistence`] backend; a failed write is logged and the in-memory
//! state stays authoritative.

mod persistence;
mod summary;

pub use persistence::{
    CartPersistence, FileCartPersistence, MemoryCartPersistence, PersistenceError,
};
pub use summary::OrderSummary;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use shopwave_core::{Price, Product, ProductId};

/// Rejected cart mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product snapshot from the last add.
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// Snapshotted unit price.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        self.product.price
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price * self.quantity
    }
}

/// The session's cart.
#[derive(Debug)]
pub struct CartStore<P> {
    lines: Vec<CartLine>,
    persistence: P,
}

impl<P: CartPersistence> CartStore<P> {
    /// Open the cart, recovering any lines saved for this session.
    ///
    /// Unreadable saved state starts an empty cart. Saved lines with a zero
    /// quantity are dropped and repeated products are merged into one line
    /// (the later snapshot wins), the same way repeated adds would.
    pub fn open(persistence: P) -> Self {
        let saved = match persistence.load() {
            Ok(Some(lines)) => lines,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to load saved cart, starting empty");
                Vec::new()
            }
        };

        let saved_count = saved.len();
        let lines = normalize_lines(saved);
        let store = Self { lines, persistence };
        if store.lines.len() != saved_count {
            warn!(
                saved = saved_count,
                kept = store.lines.len(),
                "Saved cart had empty or repeated lines"
            );
            store.persist();
        }

        debug!(lines = store.lines.len(), "Opened cart");
        store
    }

    /// Add `quantity` of a product.
    ///
    /// An existing line is incremented and its snapshot refreshed; otherwise
    /// a new line is appended. Inventory is not enforced here.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] if `quantity` is zero.
    pub fn add(&mut self, product: Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
            line.product = product;
        } else {
            self.lines.push(CartLine { product, quantity });
        }

        self.persist();
        Ok(())
    }

    /// Set a line's quantity. Zero removes the line; unknown products are
    /// ignored.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|l| &l.product.id == product_id) {
            line.quantity = quantity;
            self.persist();
        }
    }

    /// Remove a product's line if present.
    pub fn remove(&mut self, product_id: &ProductId) {
        let before = self.lines.len();
        self.lines.retain(|l| &l.product.id != product_id);
        if self.lines.len() != before {
            self.persist();
        }
    }

    /// Empty the cart and forget the saved state.
    pub fn clear(&mut self) {
        self.lines.clear();
        if let Err(e) = self.persistence.clear() {
            warn!(error = %e, "Failed to clear saved cart");
        }
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |count, line| count.saturating_add(line.quantity))
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line for a product, if any.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product.id == product_id)
    }

    /// The persistence backend.
    #[must_use]
    pub const fn persistence(&self) -> &P {
        &self.persistence
    }

    fn persist(&self) {
        if let Err(e) = self.persistence.save(&self.lines) {
            warn!(error = %e, "Failed to save cart");
        }
    }
}

fn normalize_lines(saved: Vec<CartLine>) -> Vec<CartLine> {
    let mut lines: Vec<CartLine> = Vec::with_capacity(saved.len());
    for line in saved {
        if line.quantity == 0 {
            continue;
        }
        if let Some(existing) = lines.iter_mut().find(|l| l.product.id == line.product.id) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
            existing.product = line.product;
        } else {
            lines.push(line);
        }
    }
    lines
}
