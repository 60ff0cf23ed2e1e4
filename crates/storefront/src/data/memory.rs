//! In-process data service.
//!
//! Records live in memory behind a mutex; clones share the same store.
//! Every write is journaled along with the owner token it was made with, so
//! tests can assert exactly what reached the "backend". Failures can be
//! injected per operation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use shopwave_core::{
    Category, CategoryId, NewCategory, NewOrder, NewOrderLine, NewProduct, Order, OrderId,
    OrderLine, OrderLineId, Product, ProductId,
};

use super::{DataError, DataService};

/// A write observed by the in-memory service, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    CreateCategory(CategoryId),
    CreateProduct(ProductId),
    CreateOrder(OrderId),
    CreateOrderLine(OrderLineId),
    DeleteOrder(OrderId),
    DeleteOrderLine(OrderLineId),
}

#[derive(Debug, Default)]
struct MemoryState {
    categories: Vec<Category>,
    products: Vec<Product>,
    orders: Vec<Order>,
    order_lines: Vec<OrderLine>,
    journal: Vec<Write>,
    write_tokens: Vec<Option<String>>,
    failures: Failures,
}

#[derive(Debug, Default)]
struct Failures {
    reads: bool,
    order_creation: bool,
    order_line_products: HashSet<ProductId>,
    deletes: bool,
}

/// Data service backed by process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataService {
    state: Arc<Mutex<MemoryState>>,
    owner_token: Option<SecretString>,
}

impl MemoryDataService {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with catalog records.
    #[must_use]
    pub fn with_catalog(categories: Vec<Category>, products: Vec<Product>) -> Self {
        let service = Self::new();
        {
            let mut state = service.lock();
            state.categories = categories;
            state.products = products;
        }
        service
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, state: &mut MemoryState, write: Write) {
        state.journal.push(write);
        state.write_tokens.push(
            self.owner_token
                .as_ref()
                .map(|token| token.expose_secret().to_string()),
        );
    }

    // =========================================================================
    // Failure injection
    // =========================================================================

    /// Make every read fail.
    pub fn fail_reads(&self, fail: bool) {
        self.lock().failures.reads = fail;
    }

    /// Make order header creation fail.
    pub fn fail_order_creation(&self, fail: bool) {
        self.lock().failures.order_creation = fail;
    }

    /// Make order line creation fail for the given product.
    pub fn fail_order_line_for(&self, product_id: &ProductId) {
        self.lock()
            .failures
            .order_line_products
            .insert(product_id.clone());
    }

    /// Make compensating deletes fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.lock().failures.deletes = fail;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// All stored orders.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }

    /// All stored order lines.
    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.lock().order_lines.clone()
    }

    /// Lines attached to an order, in creation order.
    #[must_use]
    pub fn lines_for(&self, order_id: &OrderId) -> Vec<OrderLine> {
        self.lock()
            .order_lines
            .iter()
            .filter(|line| &line.order_id == order_id)
            .cloned()
            .collect()
    }

    /// Every write made so far.
    #[must_use]
    pub fn writes(&self) -> Vec<Write> {
        self.lock().journal.clone()
    }

    /// The owner token each write was made with, parallel to
    /// [`writes`](Self::writes).
    #[must_use]
    pub fn write_tokens(&self) -> Vec<Option<String>> {
        self.lock().write_tokens.clone()
    }

    /// All stored products.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.lock().products.clone()
    }

    /// All stored categories.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.lock().categories.clone()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn read_failure(state: &MemoryState, resource: &str) -> Result<(), DataError> {
    if state.failures.reads {
        return Err(DataError::api(format!("Failed to read {resource}")));
    }
    Ok(())
}

impl DataService for MemoryDataService {
    fn for_owner(&self, token: Option<&SecretString>) -> Self {
        Self {
            state: Arc::clone(&self.state),
            owner_token: token.cloned(),
        }
    }

    async fn list_products(&self) -> Result<Vec<Product>, DataError> {
        let state = self.lock();
        read_failure(&state, "products")?;
        Ok(state.products.clone())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, DataError> {
        let state = self.lock();
        read_failure(&state, "product")?;
        Ok(state.products.iter().find(|p| &p.id == id).cloned())
    }

    async fn list_categories(&self, limit: Option<u32>) -> Result<Vec<Category>, DataError> {
        let state = self.lock();
        read_failure(&state, "categories")?;
        let limit = limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(state.categories.iter().take(limit).cloned().collect())
    }

    async fn create_category(&self, input: NewCategory) -> Result<Category, DataError> {
        let mut state = self.lock();
        let category = Category {
            id: CategoryId::new(new_id()),
            name: input.name,
        };
        self.record(&mut state, Write::CreateCategory(category.id.clone()));
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn create_product(&self, input: NewProduct) -> Result<Product, DataError> {
        let mut state = self.lock();
        let product = input.into_product(ProductId::new(new_id()));
        self.record(&mut state, Write::CreateProduct(product.id.clone()));
        state.products.push(product.clone());
        Ok(product)
    }

    async fn create_order(&self, input: NewOrder) -> Result<Order, DataError> {
        let mut state = self.lock();
        if state.failures.order_creation {
            return Err(DataError::api("Failed to create order"));
        }
        let order = input.into_order(OrderId::new(new_id()));
        self.record(&mut state, Write::CreateOrder(order.id.clone()));
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn create_order_line(&self, input: NewOrderLine) -> Result<OrderLine, DataError> {
        let mut state = self.lock();
        if state.failures.order_line_products.contains(&input.product_id) {
            return Err(DataError::api(format!(
                "Failed to create order item for product {}",
                input.product_id
            )));
        }
        if !state.orders.iter().any(|o| o.id == input.order_id) {
            return Err(DataError::NotFound(format!("order {}", input.order_id)));
        }
        let line = input.into_line(OrderLineId::new(new_id()));
        self.record(&mut state, Write::CreateOrderLine(line.id.clone()));
        state.order_lines.push(line.clone());
        Ok(line)
    }

    async fn delete_order(&self, id: &OrderId) -> Result<(), DataError> {
        let mut state = self.lock();
        if state.failures.deletes {
            return Err(DataError::api("Failed to delete order"));
        }
        let before = state.orders.len();
        state.orders.retain(|o| &o.id != id);
        if state.orders.len() == before {
            return Err(DataError::NotFound(format!("order {id}")));
        }
        self.record(&mut state, Write::DeleteOrder(id.clone()));
        Ok(())
    }

    async fn delete_order_line(&self, id: &OrderLineId) -> Result<(), DataError> {
        let mut state = self.lock();
        if state.failures.deletes {
            return Err(DataError::api("Failed to delete order item"));
        }
        let before = state.order_lines.len();
        state.order_lines.retain(|l| &l.id != id);
        if state.order_lines.len() == before {
            return Err(DataError::NotFound(format!("order item {id}")));
        }
        self.record(&mut state, Write::DeleteOrderLine(id.clone()));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use shopwave_core::{OrderStatus, Price, UserId};

    use super::*;

    fn new_order() -> NewOrder {
        NewOrder {
            user_id: UserId::new("u-1"),
            total: Price::from_cents(2500).unwrap(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let service = MemoryDataService::new();
        let clone = service.clone();
        clone.create_order(new_order()).await.unwrap();
        assert_eq!(service.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_order_line_requires_existing_order() {
        let service = MemoryDataService::new();
        let result = service
            .create_order_line(NewOrderLine {
                order_id: OrderId::new("missing"),
                product_id: ProductId::new("p-1"),
                quantity: 1,
                price: Price::from_cents(100).unwrap(),
            })
            .await;
        assert!(matches!(result, Err(DataError::NotFound(_))));
        assert!(service.writes().is_empty());
    }

    #[tokio::test]
    async fn test_list_categories_limit() {
        let categories = (0..3)
            .map(|i| Category {
                id: CategoryId::new(format!("c-{i}")),
                name: format!("Category {i}"),
            })
            .collect();
        let service = MemoryDataService::with_catalog(categories, Vec::new());
        assert_eq!(service.list_categories(Some(1)).await.unwrap().len(), 1);
        assert_eq!(service.list_categories(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_read_failure_injection() {
        let service = MemoryDataService::new();
        service.fail_reads(true);
        let err = service.list_products().await.unwrap_err();
        assert_eq!(err.message(), "Failed to read products");
    }

    #[tokio::test]
    async fn test_owner_handle_shares_state_and_records_token() {
        let service = MemoryDataService::new();
        let token = SecretString::from("owner-token");
        let owner = service.for_owner(Some(&token));

        owner.create_order(new_order()).await.unwrap();
        service.create_order(new_order()).await.unwrap();

        assert_eq!(service.orders().len(), 2);
        assert_eq!(
            service.write_tokens(),
            vec![Some("owner-token".to_string()), None]
        );
    }

    #[tokio::test]
    async fn test_delete_journaled() {
        let service = MemoryDataService::new();
        let order = service.create_order(new_order()).await.unwrap();
        service.delete_order(&order.id).await.unwrap();
        assert!(service.orders().is_empty());
        assert_eq!(
            service.writes(),
            vec![Write::CreateOrder(order.id.clone()), Write::DeleteOrder(order.id)]
        );
    }
}
