//! Cart commands.

use tracing::{info, warn};

use shopwave_core::ProductId;
use shopwave_storefront::cart::OrderSummary;
use shopwave_storefront::catalog::clamp_quantity;
use shopwave_storefront::data::DataService;
use shopwave_storefront::error::{Result, StorefrontError, add_breadcrumb};

use super::Session;

/// Add a product, clamping the quantity to its inventory.
///
/// # Errors
///
/// Returns [`StorefrontError::NotFound`] for an unknown product,
/// [`StorefrontError::BadRequest`] when it is out of stock, or an error if
/// the catalog read fails.
pub async fn add<D: DataService>(
    session: &mut Session<D>,
    id: &str,
    quantity: u32,
) -> Result<()> {
    let product = session
        .catalog
        .get_product(&ProductId::new(id))
        .await?
        .ok_or_else(|| StorefrontError::NotFound(format!("product {id}")))?;

    if !product.in_stock() {
        return Err(StorefrontError::BadRequest(format!(
            "{} is out of stock",
            product.name
        )));
    }

    let clamped = clamp_quantity(quantity, product.inventory);
    if clamped != quantity {
        warn!(requested = quantity, available = product.inventory, "Quantity adjusted");
    }

    let name = product.name.clone();
    session.cart.add(product, clamped)?;
    add_breadcrumb("cart", "Added product", Some(&[("product_id", id)]));
    info!(quantity = clamped, items = session.cart.item_count(), "Added {name} to cart");
    Ok(())
}

/// Set a line's quantity; zero removes it.
pub fn update<D: DataService>(session: &mut Session<D>, id: &str, quantity: u32) {
    let product_id = ProductId::new(id);
    if session.cart.line(&product_id).is_none() {
        info!("{id} is not in the cart");
        return;
    }
    session.cart.update_quantity(&product_id, quantity);
    info!(quantity, items = session.cart.item_count(), "Updated cart");
}

/// Remove a product's line.
pub fn remove<D: DataService>(session: &mut Session<D>, id: &str) {
    session.cart.remove(&ProductId::new(id));
    info!(items = session.cart.item_count(), "Removed {id} from cart");
}

/// Print the cart lines and the order summary.
pub fn show<D: DataService>(session: &Session<D>) {
    if session.cart.is_empty() {
        info!("Your cart is empty");
        return;
    }

    for line in session.cart.lines() {
        info!(
            id = %line.product.id,
            quantity = line.quantity,
            unit_price = %line.unit_price(),
            line_total = %line.line_total(),
            "{}",
            line.product.name
        );
    }

    let summary = OrderSummary::from_cart(&session.cart, session.tax_rate);
    info!(items = session.cart.item_count(), "Subtotal {}", summary.subtotal);
    if summary.shipping.is_zero() {
        info!("Shipping Free");
    } else {
        info!("Shipping {}", summary.shipping);
    }
    info!("Tax {}", summary.tax);
    info!("Total {}", summary.total);
}

/// Empty the cart.
pub fn clear<D: DataService>(session: &mut Session<D>) {
    session.cart.clear();
    info!("Cart cleared");
}
