//! Starter catalog seeding.
//!
//! A [`SeedCatalog`] lists categories by name and products that reference
//! a category by name. [`seed_catalog`] loads it into a data service once:
//! if any category already exists the service is left alone.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument};

use shopwave_core::{Category, CategoryId, NewCategory, NewProduct, Price, Product, ProductId};

use crate::data::{DataError, DataService};

const DEFAULT_CATALOG: &str = include_str!("catalog.yaml");

/// Seeding failure.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A product names a category the catalog does not define.
    #[error("Product '{product}' references unknown category '{category}'")]
    UnknownCategory { product: String, category: String },

    #[error("Data service error: {0}")]
    Data(#[from] DataError),
}

/// Category entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedCategory {
    pub name: String,
}

/// Product entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    pub inventory: u32,
    /// Category name.
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A catalog to seed.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedCatalog {
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// Result of a seeding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Categories already existed; nothing was written.
    Skipped,
    /// Records were created.
    Seeded { categories: usize, products: usize },
}

impl SeedCatalog {
    /// The built-in starter catalog (4 categories, 6 products).
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalog fails to parse or validate.
    pub fn default_catalog() -> Result<Self, SeedError> {
        Self::from_yaml(DEFAULT_CATALOG)
    }

    /// Parse and validate a YAML catalog.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Yaml`] for malformed YAML and
    /// [`SeedError::UnknownCategory`] for a dangling category reference.
    pub fn from_yaml(yaml: &str) -> Result<Self, SeedError> {
        let catalog: Self = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read, parse and validate a YAML catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid catalog.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_yaml(&content)
    }

    /// Check every product's category reference.
    ///
    /// # Errors
    ///
    /// Returns the first [`SeedError::UnknownCategory`].
    pub fn validate(&self) -> Result<(), SeedError> {
        for product in &self.products {
            if !self.categories.iter().any(|c| c.name == product.category) {
                return Err(SeedError::UnknownCategory {
                    product: product.name.clone(),
                    category: product.category.clone(),
                });
            }
        }
        Ok(())
    }

    /// Materialize the catalog with ids derived from names, for an in-memory
    /// service that needs ids stable across runs.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::UnknownCategory`] for a dangling reference.
    pub fn to_records(&self) -> Result<(Vec<Category>, Vec<Product>), SeedError> {
        self.validate()?;

        let categories: Vec<Category> = self
            .categories
            .iter()
            .map(|c| Category {
                id: CategoryId::new(slug(&c.name)),
                name: c.name.clone(),
            })
            .collect();

        let products = self
            .products
            .iter()
            .map(|p| Product {
                id: ProductId::new(slug(&p.name)),
                name: p.name.clone(),
                description: p.description.clone(),
                price: p.price,
                inventory: p.inventory,
                category_id: Some(CategoryId::new(slug(&p.category))),
                image_url: p.image_url.clone(),
            })
            .collect();

        Ok((categories, products))
    }
}

/// Lowercase ASCII alphanumerics joined by single dashes.
fn slug(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Load `catalog` into an empty data service.
///
/// Categories are created first, then products with their category ids.
///
/// # Errors
///
/// Returns [`SeedError::UnknownCategory`] before any write when the catalog
/// is inconsistent, or [`SeedError::Data`] when a read or write fails.
#[instrument(
    skip_all,
    fields(categories = catalog.categories.len(), products = catalog.products.len())
)]
pub async fn seed_catalog<D: DataService>(
    data: &D,
    catalog: &SeedCatalog,
) -> Result<SeedOutcome, SeedError> {
    catalog.validate()?;

    if !data.list_categories(Some(1)).await?.is_empty() {
        info!("Catalog already seeded, skipping");
        return Ok(SeedOutcome::Skipped);
    }

    let mut category_ids: HashMap<&str, CategoryId> = HashMap::new();
    for category in &catalog.categories {
        let created = data
            .create_category(NewCategory {
                name: category.name.clone(),
            })
            .await?;
        category_ids.insert(category.name.as_str(), created.id);
    }

    for product in &catalog.products {
        data.create_product(NewProduct {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            inventory: product.inventory,
            category_id: category_ids.get(product.category.as_str()).cloned(),
            image_url: product.image_url.clone(),
        })
        .await?;
    }

    info!(
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        "Seeded catalog"
    );

    Ok(SeedOutcome::Seeded {
        categories: catalog.categories.len(),
        products: catalog.products.len(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::data::MemoryDataService;

    #[test]
    fn test_default_catalog() {
        let catalog = SeedCatalog::default_catalog().unwrap();
        assert_eq!(catalog.categories.len(), 4);
        assert_eq!(catalog.products.len(), 6);

        let headphones = catalog.products.first().unwrap();
        assert_eq!(headphones.name, "Wireless Headphones");
        assert_eq!(headphones.price, Price::from_cents(19999).unwrap());
        assert_eq!(headphones.inventory, 45);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let yaml = r"
categories:
  - name: Books
products:
  - name: Lamp
    price: '10.00'
    inventory: 1
    category: Lighting
";
        assert!(matches!(
            SeedCatalog::from_yaml(yaml),
            Err(SeedError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Home & Kitchen"), "home-kitchen");
        assert_eq!(slug("Cotton T-Shirt"), "cotton-t-shirt");
    }

    #[test]
    fn test_to_records_uses_stable_ids() {
        let (categories, products) = SeedCatalog::default_catalog().unwrap().to_records().unwrap();
        assert!(categories.iter().any(|c| c.id.as_str() == "home-kitchen"));
        let maker = products.iter().find(|p| p.name == "Coffee Maker").unwrap();
        assert_eq!(maker.id.as_str(), "coffee-maker");
        assert_eq!(maker.category_id.as_ref().unwrap().as_str(), "home-kitchen");
    }

    #[tokio::test]
    async fn test_seed_links_products_to_categories() {
        let data = MemoryDataService::new();
        let catalog = SeedCatalog::default_catalog().unwrap();

        let outcome = seed_catalog(&data, &catalog).await.unwrap();
        assert_eq!(
            outcome,
            SeedOutcome::Seeded {
                categories: 4,
                products: 6
            }
        );

        let books = data
            .categories()
            .into_iter()
            .find(|c| c.name == "Books")
            .unwrap();
        let novel = data
            .products()
            .into_iter()
            .find(|p| p.name == "Bestselling Novel")
            .unwrap();
        assert_eq!(novel.category_id, Some(books.id));
    }

    #[tokio::test]
    async fn test_seed_is_skipped_when_categories_exist() {
        let data = MemoryDataService::new();
        let catalog = SeedCatalog::default_catalog().unwrap();
        seed_catalog(&data, &catalog).await.unwrap();
        let writes = data.writes().len();

        assert_eq!(seed_catalog(&data, &catalog).await.unwrap(), SeedOutcome::Skipped);
        assert_eq!(data.writes().len(), writes);
    }
}
