//! Catalog browsing commands.

use tracing::info;

use shopwave_core::{CategoryId, Product, ProductId};
use shopwave_storefront::catalog::{
    FEATURED_COUNT, ProductSort, featured, filter_by_category, sort_products,
};
use shopwave_storefront::data::DataService;
use shopwave_storefront::error::{Result, StorefrontError};

use super::Session;

fn print_product(product: &Product) {
    info!(
        id = %product.id,
        price = %product.price,
        stock = %product.stock_label(),
        "{}",
        product.name
    );
}

/// List products, optionally filtered by category and sorted.
///
/// # Errors
///
/// Returns an error if the catalog read fails.
pub async fn list_products<D: DataService>(
    session: &Session<D>,
    category: Option<String>,
    sort: ProductSort,
) -> Result<()> {
    let category = category.map(CategoryId::new);
    let mut products =
        filter_by_category(session.catalog.list_products().await?, category.as_ref());
    sort_products(&mut products, sort);

    if products.is_empty() {
        info!("No products found");
    }
    for product in &products {
        print_product(product);
    }
    Ok(())
}

/// List the home page's featured products.
///
/// # Errors
///
/// Returns an error if the catalog read fails.
pub async fn featured_products<D: DataService>(
    session: &Session<D>,
) -> Result<()> {
    let products = session.catalog.list_products().await?;
    for product in featured(&products, FEATURED_COUNT) {
        print_product(product);
    }
    Ok(())
}

/// Show one product's details.
///
/// # Errors
///
/// Returns [`StorefrontError::NotFound`] for an unknown id, or an error if the
/// catalog read fails.
pub async fn show_product<D: DataService>(
    session: &Session<D>,
    id: &str,
) -> Result<()> {
    let product = session
        .catalog
        .get_product(&ProductId::new(id))
        .await?
        .ok_or_else(|| StorefrontError::NotFound(format!("product {id}")))?;

    print_product(&product);
    if let Some(description) = &product.description {
        info!("{description}");
    }
    if let Some(category_id) = &product.category_id {
        let categories = session.catalog.list_categories_or_empty().await;
        if let Some(category) = categories.iter().find(|c| &c.id == category_id) {
            info!(category = %category.name, "Category");
        }
    }
    info!(url = %product.image_or_placeholder(600, 400), "Image");
    Ok(())
}

/// List categories.
///
/// # Errors
///
/// Returns an error if the catalog read fails.
pub async fn list_categories<D: DataService>(
    session: &Session<D>,
) -> Result<()> {
    let categories = session.catalog.list_categories().await?;
    if categories.is_empty() {
        info!("No categories found");
    }
    for category in &categories {
        info!(id = %category.id, "{}", category.name);
    }
    Ok(())
}
