//! Order records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::id::{OrderId, OrderLineId, ProductId, UserId};
use super::price::Price;
use super::status::OrderStatus;

/// An order header. Created once at checkout and never mutated by the
/// storefront afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Price,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// One line of an order. `price` is the unit price captured at submission
/// time and is never re-derived from the live product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Price,
}

/// Input for creating an order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: UserId,
    pub total: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Attach the service-assigned id.
    #[must_use]
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            user_id: self.user_id,
            total: self.total,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Input for creating an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderLine {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Price,
}

impl NewOrderLine {
    /// Attach the service-assigned id.
    #[must_use]
    pub fn into_line(self, id: OrderLineId) -> OrderLine {
        OrderLine {
            id,
            order_id: self.order_id,
            product_id: self.product_id,
            quantity: self.quantity,
            price: self.price,
        }
    }
}

// The schema leaves `status` nullable.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
