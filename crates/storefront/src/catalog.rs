//! Read-only catalog access.
//!
//! [`CatalogClient`] returns explicit results so the caller decides whether a
//! failed read degrades to an empty page or surfaces as an error. The
//! `*_or_empty` helpers are the degrade-and-log variants.
//!
//! The free functions at the bottom are the pure list helpers the product
//! pages use: category filter, sort orders, featured slice and the quantity
//! picker clamp.

use std::cmp::Ordering;
use std::str::FromStr;

use thiserror::Error;
use tracing::{instrument, warn};

use shopwave_core::{Category, CategoryId, Product, ProductId};

use crate::data::{DataError, DataService};

/// Number of products shown on the home page.
pub const FEATURED_COUNT: usize = 4;

/// Catalog read failure.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The data service read failed.
    #[error("failed to read {resource}: {source}")]
    ReadFailed {
        /// What was being read (e.g. `products`).
        resource: String,
        #[source]
        source: DataError,
    },
}

impl CatalogError {
    fn read_failed(resource: impl Into<String>, source: DataError) -> Self {
        Self::ReadFailed {
            resource: resource.into(),
            source,
        }
    }
}

/// Product and category reads against the data service.
#[derive(Debug, Clone)]
pub struct CatalogClient<D> {
    data: D,
}

impl<D: DataService> CatalogClient<D> {
    /// Wrap a data service.
    #[must_use]
    pub const fn new(data: D) -> Self {
        Self { data }
    }

    /// The underlying data service.
    #[must_use]
    pub const fn data(&self) -> &D {
        &self.data
    }

    /// List every product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ReadFailed`] if the data service read fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        self.data
            .list_products()
            .await
            .map_err(|e| CatalogError::read_failed("products", e))
    }

    /// Get a product; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ReadFailed`] if the data service read fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        match self.data.get_product(id).await {
            Ok(product) => Ok(product),
            Err(DataError::NotFound(_)) => Ok(None),
            Err(e) => Err(CatalogError::read_failed(format!("product {id}"), e)),
        }
    }

    /// List every category.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ReadFailed`] if the data service read fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.data
            .list_categories(None)
            .await
            .map_err(|e| CatalogError::read_failed("categories", e))
    }

    /// List products, logging a failure and returning an empty list instead.
    pub async fn list_products_or_empty(&self) -> Vec<Product> {
        self.list_products().await.unwrap_or_else(|e| {
            warn!(error = %e, "Error fetching products");
            Vec::new()
        })
    }

    /// Get a product, logging a failure and returning `None` instead.
    pub async fn get_product_or_none(&self, id: &ProductId) -> Option<Product> {
        self.get_product(id).await.unwrap_or_else(|e| {
            warn!(error = %e, product_id = %id, "Error fetching product");
            None
        })
    }

    /// List categories, logging a failure and returning an empty list instead.
    pub async fn list_categories_or_empty(&self) -> Vec<Category> {
        self.list_categories().await.unwrap_or_else(|e| {
            warn!(error = %e, "Error fetching categories");
            Vec::new()
        })
    }
}

// =============================================================================
// List helpers
// =============================================================================

/// Product list ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Alphabetical by name, case-insensitive.
    #[default]
    Name,
    /// Cheapest first.
    PriceLowToHigh,
    /// Most expensive first.
    PriceHighToLow,
}

impl ProductSort {
    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::PriceLowToHigh => a.price.cmp(&b.price),
            Self::PriceHighToLow => b.price.cmp(&a.price),
        }
    }
}

impl FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "price-low" => Ok(Self::PriceLowToHigh),
            "price-high" => Ok(Self::PriceHighToLow),
            _ => Err(format!(
                "invalid sort '{s}' (expected name, price-low or price-high)"
            )),
        }
    }
}

/// Keep products in the given category; `None` keeps everything.
#[must_use]
pub fn filter_by_category(products: Vec<Product>, category: Option<&CategoryId>) -> Vec<Product> {
    match category {
        Some(id) => products.into_iter().filter(|p| p.in_category(id)).collect(),
        None => products,
    }
}

/// Sort products in place. The sort is stable.
pub fn sort_products(products: &mut [Product], sort: ProductSort) {
    products.sort_by(|a, b| sort.compare(a, b));
}

/// The first `count` products.
#[must_use]
pub fn featured(products: &[Product], count: usize) -> &[Product] {
    products.get(..count).unwrap_or(products)
}

/// Clamp a requested quantity into `1..=inventory`.
///
/// Out-of-stock products clamp to 1; the caller disables adding them.
#[must_use]
pub fn clamp_quantity(requested: u32, inventory: u32) -> u32 {
    requested.min(inventory).max(1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopwave_core::Price;

    use super::*;
    use crate::data::MemoryDataService;

    fn product(id: &str, name: &str, cents: i64, category: Option<&str>) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: None,
            price: Price::from_cents(cents).unwrap(),
            inventory: 10,
            category_id: category.map(CategoryId::new),
            image_url: None,
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("p-1", "smart Watch", 24999, Some("c-electronics")),
            product("p-2", "Cotton T-Shirt", 1999, Some("c-clothing")),
            product("p-3", "Bluetooth Speaker", 7999, Some("c-electronics")),
            product("p-4", "Bestselling Novel", 1499, None),
        ]
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_list_products() {
        let client = CatalogClient::new(MemoryDataService::with_catalog(Vec::new(), catalog()));
        assert_eq!(client.list_products().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_get_product_absent() {
        let client = CatalogClient::new(MemoryDataService::with_catalog(Vec::new(), catalog()));
        assert!(client.get_product(&ProductId::new("nope")).await.unwrap().is_none());
        assert_eq!(
            client.get_product(&ProductId::new("p-2")).await.unwrap().unwrap().name,
            "Cotton T-Shirt"
        );
    }

    #[tokio::test]
    async fn test_read_failure_is_distinguishable() {
        let data = MemoryDataService::with_catalog(Vec::new(), catalog());
        data.fail_reads(true);
        let client = CatalogClient::new(data);

        let err = client.list_products().await.unwrap_err();
        assert!(err.to_string().starts_with("failed to read products"));
        assert!(client.list_categories().await.is_err());
        assert!(client.get_product(&ProductId::new("p-1")).await.is_err());
    }

    #[tokio::test]
    async fn test_degrading_helpers_swallow_failures() {
        let data = MemoryDataService::with_catalog(Vec::new(), catalog());
        data.fail_reads(true);
        let client = CatalogClient::new(data);

        assert!(client.list_products_or_empty().await.is_empty());
        assert!(client.list_categories_or_empty().await.is_empty());
        assert!(client.get_product_or_none(&ProductId::new("p-1")).await.is_none());
    }

    #[test]
    fn test_filter_by_category() {
        let electronics = CategoryId::new("c-electronics");
        let filtered = filter_by_category(catalog(), Some(&electronics));
        assert_eq!(names(&filtered), vec!["smart Watch", "Bluetooth Speaker"]);
        assert_eq!(filter_by_category(catalog(), None).len(), 4);
    }

    #[test]
    fn test_sort_orders() {
        let mut products = catalog();

        sort_products(&mut products, ProductSort::Name);
        assert_eq!(
            names(&products),
            vec!["Bestselling Novel", "Bluetooth Speaker", "Cotton T-Shirt", "smart Watch"]
        );

        sort_products(&mut products, ProductSort::PriceLowToHigh);
        assert_eq!(products.first().unwrap().name, "Bestselling Novel");

        sort_products(&mut products, ProductSort::PriceHighToLow);
        assert_eq!(products.first().unwrap().name, "smart Watch");
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!("price-low".parse::<ProductSort>().unwrap(), ProductSort::PriceLowToHigh);
        assert_eq!("price-high".parse::<ProductSort>().unwrap(), ProductSort::PriceHighToLow);
        assert_eq!("name".parse::<ProductSort>().unwrap(), ProductSort::Name);
        assert!("newest".parse::<ProductSort>().is_err());
    }

    #[test]
    fn test_featured() {
        let products = catalog();
        assert_eq!(featured(&products, FEATURED_COUNT).len(), 4);
        assert_eq!(featured(&products, 2).len(), 2);
        assert_eq!(featured(&products, 10).len(), 4);
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(3, 10), 3);
        assert_eq!(clamp_quantity(0, 10), 1);
        assert_eq!(clamp_quantity(50, 15), 15);
        assert_eq!(clamp_quantity(2, 0), 1);
    }
}
