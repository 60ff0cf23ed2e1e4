//! Checkout command.

use tracing::info;

use shopwave_storefront::checkout::{Checkout, CompensationPolicy};
use shopwave_storefront::data::DataService;
use shopwave_storefront::error::Result;

use super::Session;

/// Place an order for the session cart and clear it on success.
///
/// # Errors
///
/// Returns the checkout failure; the cart is left untouched in that case.
pub async fn place_order<D: DataService>(
    session: &mut Session<D>,
    leave_dangling: bool,
) -> Result<()> {
    let policy = if leave_dangling {
        CompensationPolicy::LeaveDangling
    } else {
        CompensationPolicy::Compensate
    };

    let placed = Checkout::new(session.data(), &session.identity)
        .with_policy(policy)
        .place_cart_order(&session.cart)
        .await?;

    session.cart.clear();
    info!(
        order_id = %placed.order.id,
        total = %placed.order.total,
        lines = placed.lines.len(),
        "Order placed. Thank you for your purchase!"
    );
    Ok(())
}
