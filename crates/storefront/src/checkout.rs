//! Order submission.
//!
//! Checkout turns the cart into one order header plus one order line per
//! cart line. The data service has no multi-record transaction, so a line
//! that fails part-way leaves earlier writes behind; [`CompensationPolicy`]
//! decides whether those writes are rolled back with compensating deletes.
//!
//! Every write is made with the resolved user's access token, so the
//! service attributes the order to the same owner named in `userId`.
//!
//! The flow never touches the cart. Clearing it after a successful order is
//! the caller's job.

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use shopwave_core::{
    NewOrder, NewOrderLine, Order, OrderId, OrderLine, OrderStatus, Price, ProductId,
};

use crate::cart::{CartLine, CartPersistence, CartStore};
use crate::data::{DataError, DataService};
use crate::error::{add_breadcrumb, capture};
use crate::services::auth::IdentityProvider;

/// Message shown to the shopper for any failed order write.
pub const CHECKOUT_FAILED_MESSAGE: &str =
    "An error occurred during checkout. Please try again.";

/// Checkout failure.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nobody is signed in.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// The order header write was rejected. Nothing was written.
    #[error("Failed to create order: {0}")]
    OrderCreationFailed(#[source] DataError),

    /// An order line write was rejected after the header was created.
    #[error("Failed to create order line for product {product_id} on order {order_id}: {source}")]
    OrderLineCreationFailed {
        order_id: OrderId,
        product_id: ProductId,
        /// Whether the order and its earlier lines were deleted again.
        compensated: bool,
        #[source]
        source: DataError,
    },
}

impl CheckoutError {
    /// Whether this failure is unexpected and worth reporting.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::OrderCreationFailed(_) | Self::OrderLineCreationFailed { .. }
        )
    }

    /// Whether the caller should send the shopper to sign in.
    #[must_use]
    pub const fn requires_sign_in(&self) -> bool {
        matches!(self, Self::AuthenticationRequired)
    }

    /// Message to show the shopper, or `None` when the caller redirects to
    /// sign-in instead.
    #[must_use]
    pub const fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::AuthenticationRequired => None,
            Self::EmptyCart => Some("Your cart is empty."),
            Self::OrderCreationFailed(_) | Self::OrderLineCreationFailed { .. } => {
                Some(CHECKOUT_FAILED_MESSAGE)
            }
        }
    }
}

/// What to do with earlier writes when an order line fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompensationPolicy {
    /// Delete created lines (newest first), then the order.
    #[default]
    Compensate,
    /// Leave the order and its created lines in place.
    LeaveDangling,
}

/// A successfully placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order: Order,
    /// Created lines, in cart order.
    pub lines: Vec<OrderLine>,
}

/// Places orders against a data service for the current user.
#[derive(Debug)]
pub struct Checkout<'a, D, I> {
    data: &'a D,
    identity: &'a I,
    policy: CompensationPolicy,
}

impl<'a, D: DataService, I: IdentityProvider> Checkout<'a, D, I> {
    #[must_use]
    pub const fn new(data: &'a D, identity: &'a I) -> Self {
        Self {
            data,
            identity,
            policy: CompensationPolicy::Compensate,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: CompensationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Place an order for the cart's lines and total.
    ///
    /// # Errors
    ///
    /// See [`Checkout::place_order`].
    pub async fn place_cart_order<P: CartPersistence>(
        &self,
        cart: &CartStore<P>,
    ) -> Result<PlacedOrder, CheckoutError> {
        self.place_order(cart.lines(), cart.total()).await
    }

    /// Place an order: identity, then the header, then each line in order.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::AuthenticationRequired`] if nobody is signed in
    /// - [`CheckoutError::EmptyCart`] if `lines` is empty
    /// - [`CheckoutError::OrderCreationFailed`] if the header write fails
    /// - [`CheckoutError::OrderLineCreationFailed`] on the first failed line
    #[instrument(skip(self, lines, total), fields(lines = lines.len(), total = %total))]
    pub async fn place_order(
        &self,
        lines: &[CartLine],
        total: Price,
    ) -> Result<PlacedOrder, CheckoutError> {
        let user = self.identity.current_user().await.map_err(|e| {
            info!(error = %e, "Checkout without a signed-in user");
            CheckoutError::AuthenticationRequired
        })?;

        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let data = self.data.for_owner(user.token.as_ref());

        let order = data
            .create_order(NewOrder {
                user_id: user.id.clone(),
                total,
                status: OrderStatus::Pending,
                created_at: Utc::now(),
            })
            .await
            .map_err(|e| {
                let err = CheckoutError::OrderCreationFailed(e);
                capture(&err, "Checkout failed");
                err
            })?;

        info!(order_id = %order.id, user_id = %user.id, "Order created");
        add_breadcrumb("checkout", "Order created", Some(&[("order_id", order.id.as_str())]));

        let mut created = Vec::with_capacity(lines.len());
        for line in lines {
            let input = NewOrderLine {
                order_id: order.id.clone(),
                product_id: line.product.id.clone(),
                quantity: line.quantity,
                price: line.unit_price(),
            };

            match data.create_order_line(input).await {
                Ok(order_line) => created.push(order_line),
                Err(source) => {
                    let compensated = match self.policy {
                        CompensationPolicy::Compensate => {
                            compensate(&data, &order.id, &created).await
                        }
                        CompensationPolicy::LeaveDangling => {
                            warn!(
                                order_id = %order.id,
                                lines_created = created.len(),
                                "Leaving partially written order in place"
                            );
                            false
                        }
                    };

                    let err = CheckoutError::OrderLineCreationFailed {
                        order_id: order.id,
                        product_id: line.product.id.clone(),
                        compensated,
                        source,
                    };
                    capture(&err, "Checkout failed");
                    return Err(err);
                }
            }
        }

        let count = created.len().to_string();
        add_breadcrumb(
            "checkout",
            "Order lines created",
            Some(&[("order_id", order.id.as_str()), ("lines", count.as_str())]),
        );
        info!(order_id = %order.id, lines = created.len(), "Order placed");

        Ok(PlacedOrder {
            order,
            lines: created,
        })
    }

}

/// Delete created lines newest first, then the order. Returns whether
/// every delete succeeded.
async fn compensate<D: DataService>(
    data: &D,
    order_id: &OrderId,
    created: &[OrderLine],
) -> bool {
    let mut clean = true;

    for line in created.iter().rev() {
        if let Err(e) = data.delete_order_line(&line.id).await {
            error!(
                error = %e,
                order_id = %order_id,
                line_id = %line.id,
                "Failed to delete order line"
            );
            clean = false;
        }
    }

    if let Err(e) = data.delete_order(order_id).await {
        error!(error = %e, order_id = %order_id, "Failed to delete order");
        clean = false;
    }

    if clean {
        info!(order_id = %order_id, lines = created.len(), "Rolled back partial order");
    }
    clean
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use shopwave_core::{Product, UserId};

    use super::*;
    use crate::data::{MemoryDataService, Write};
    use crate::services::auth::{AuthenticatedUser, SessionIdentity};

    fn line(id: &str, cents: i64, quantity: u32) -> CartLine {
        CartLine {
            product: Product {
                id: ProductId::new(id),
                name: format!("Product {id}"),
                description: None,
                price: Price::from_cents(cents).unwrap(),
                inventory: 10,
                category_id: None,
                image_url: None,
            },
            quantity,
        }
    }

    fn signed_in() -> SessionIdentity {
        SessionIdentity::signed_in(AuthenticatedUser::new(UserId::new("sub-1")))
    }

    #[tokio::test]
    async fn test_places_order_with_lines_in_cart_order() {
        let data = MemoryDataService::new();
        let identity = signed_in();
        let lines = [line("p-1", 1000, 2), line("p-2", 500, 1)];

        let placed = Checkout::new(&data, &identity)
            .place_order(&lines, Price::from_cents(2500).unwrap())
            .await
            .unwrap();

        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.order.user_id.as_str(), "sub-1");
        assert_eq!(placed.order.total, Price::from_cents(2500).unwrap());
        let products: Vec<_> = placed.lines.iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(products, vec!["p-1", "p-2"]);
        assert_eq!(data.lines_for(&placed.order.id), placed.lines);
    }

    #[tokio::test]
    async fn test_writes_use_signed_in_users_token() {
        let data = MemoryDataService::new();
        let identity = SessionIdentity::signed_in(
            AuthenticatedUser::new(UserId::new("sub-1"))
                .with_token(SecretString::from("token-sub-1")),
        );

        Checkout::new(&data, &identity)
            .place_order(
                &[line("p-1", 1000, 1), line("p-2", 500, 2)],
                Price::from_cents(2000).unwrap(),
            )
            .await
            .unwrap();

        // Header plus two lines, all made as the signed-in owner
        let tokens = data.write_tokens();
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| t.as_deref() == Some("token-sub-1")));

        // A later sign-in switches the credential with the owner
        identity
            .sign_in(
                AuthenticatedUser::new(UserId::new("sub-2"))
                    .with_token(SecretString::from("token-sub-2")),
            )
            .await;
        let placed = Checkout::new(&data, &identity)
            .place_order(&[line("p-1", 1000, 1)], Price::from_cents(1000).unwrap())
            .await
            .unwrap();
        assert_eq!(placed.order.user_id.as_str(), "sub-2");
        assert_eq!(
            data.write_tokens().last().cloned().flatten().as_deref(),
            Some("token-sub-2")
        );
    }

    #[tokio::test]
    async fn test_compensating_deletes_use_the_same_token() {
        let data = MemoryDataService::new();
        data.fail_order_line_for(&ProductId::new("p-2"));
        let identity = SessionIdentity::signed_in(
            AuthenticatedUser::new(UserId::new("sub-1"))
                .with_token(SecretString::from("token-sub-1")),
        );

        Checkout::new(&data, &identity)
            .place_order(
                &[line("p-1", 100, 1), line("p-2", 100, 1)],
                Price::from_cents(200).unwrap(),
            )
            .await
            .unwrap_err();

        // Order, line, line delete, order delete
        let tokens = data.write_tokens();
        assert_eq!(tokens.len(), 4);
        assert!(tokens.iter().all(|t| t.as_deref() == Some("token-sub-1")));
    }

    #[tokio::test]
    async fn test_unauthenticated_writes_nothing() {
        let data = MemoryDataService::new();
        let identity = SessionIdentity::anonymous();

        let err = Checkout::new(&data, &identity)
            .place_order(&[line("p-1", 1000, 1)], Price::from_cents(1000).unwrap())
            .await
            .unwrap_err();

        assert!(err.requires_sign_in());
        assert!(err.user_message().is_none());
        assert!(data.writes().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_writes_nothing() {
        let data = MemoryDataService::new();
        let identity = signed_in();

        let err = Checkout::new(&data, &identity)
            .place_order(&[], Price::ZERO)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
        assert!(data.writes().is_empty());
    }

    #[tokio::test]
    async fn test_order_creation_failure_stops() {
        let data = MemoryDataService::new();
        data.fail_order_creation(true);
        let identity = signed_in();

        let err = Checkout::new(&data, &identity)
            .place_order(&[line("p-1", 1000, 1)], Price::from_cents(1000).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::OrderCreationFailed(_)));
        assert_eq!(err.user_message(), Some(CHECKOUT_FAILED_MESSAGE));
        assert!(data.writes().is_empty());
    }

    #[tokio::test]
    async fn test_line_failure_compensates_by_default() {
        let data = MemoryDataService::new();
        data.fail_order_line_for(&ProductId::new("p-3"));
        let identity = signed_in();
        let lines = [
            line("p-1", 100, 1),
            line("p-2", 100, 1),
            line("p-3", 100, 1),
            line("p-4", 100, 1),
        ];

        let err = Checkout::new(&data, &identity)
            .place_order(&lines, Price::from_cents(400).unwrap())
            .await
            .unwrap_err();

        let CheckoutError::OrderLineCreationFailed {
            order_id,
            product_id,
            compensated,
            ..
        } = err
        else {
            panic!("expected an order line failure");
        };
        assert_eq!(product_id.as_str(), "p-3");
        assert!(compensated);
        assert!(data.orders().is_empty());
        assert!(data.order_lines().is_empty());

        // Two lines created, then deleted newest first, then the order
        let writes = data.writes();
        assert_eq!(writes.len(), 6);
        assert_eq!(writes.last(), Some(&Write::DeleteOrder(order_id)));
        assert!(matches!(writes.get(3), Some(Write::DeleteOrderLine(_))));
        assert_eq!(
            writes.get(3).cloned(),
            writes.get(2).and_then(|w| match w {
                Write::CreateOrderLine(id) => Some(Write::DeleteOrderLine(id.clone())),
                _ => None,
            })
        );
    }

    #[tokio::test]
    async fn test_line_failure_can_leave_dangling_order() {
        let data = MemoryDataService::new();
        data.fail_order_line_for(&ProductId::new("p-2"));
        let identity = signed_in();
        let lines = [line("p-1", 100, 1), line("p-2", 100, 1), line("p-3", 100, 1)];

        let err = Checkout::new(&data, &identity)
            .with_policy(CompensationPolicy::LeaveDangling)
            .place_order(&lines, Price::from_cents(300).unwrap())
            .await
            .unwrap_err();

        let CheckoutError::OrderLineCreationFailed {
            order_id,
            compensated,
            ..
        } = err
        else {
            panic!("expected an order line failure");
        };
        assert!(!compensated);
        assert_eq!(data.orders().len(), 1);
        // Only the line before the failure exists; p-3 was never attempted
        let remaining = data.lines_for(&order_id);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining.first().unwrap().product_id.as_str(), "p-1");
    }

    #[tokio::test]
    async fn test_failed_compensation_is_reported() {
        let data = MemoryDataService::new();
        data.fail_order_line_for(&ProductId::new("p-2"));
        data.fail_deletes(true);
        let identity = signed_in();

        let err = Checkout::new(&data, &identity)
            .place_order(
                &[line("p-1", 100, 1), line("p-2", 100, 1)],
                Price::from_cents(200).unwrap(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::OrderLineCreationFailed {
                compensated: false,
                ..
            }
        ));
        assert_eq!(data.orders().len(), 1);
    }

    #[test]
    fn test_error_presentation() {
        assert!(!CheckoutError::EmptyCart.is_reportable());
        assert!(CheckoutError::OrderCreationFailed(DataError::api("boom")).is_reportable());
        assert!(!CheckoutError::OrderCreationFailed(DataError::api("boom")).requires_sign_in());
    }
}
