//! Seed the data service with a starter catalog.
//!
//! Reads a YAML catalog (or the built-in one), validates it before touching
//! the data service, and creates categories then products. A service that
//! already has categories is left alone.

use std::path::Path;

use tracing::info;

use shopwave_storefront::data::DataService;
use shopwave_storefront::error::{Result, StorefrontError};
use shopwave_storefront::seed::{SeedCatalog, SeedOutcome, seed_catalog};

use super::Session;

/// Seed from `file_path`, or the built-in catalog when `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the catalog is invalid, or a
/// data service call fails.
pub async fn catalog<D: DataService>(
    session: &Session<D>,
    file_path: Option<&str>,
) -> Result<()> {
    let catalog = match file_path {
        Some(file_path) => {
            let path = Path::new(file_path);
            if !path.exists() {
                return Err(StorefrontError::NotFound(format!("file {file_path}")));
            }
            info!(path = %file_path, "Loading catalog from file");
            SeedCatalog::from_file(path).await?
        }
        None => SeedCatalog::default_catalog()?,
    };

    info!(
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        "Catalog validated"
    );

    match seed_catalog(&session.owner_data().await, &catalog).await? {
        SeedOutcome::Skipped => info!("Categories already exist, nothing to do"),
        SeedOutcome::Seeded {
            categories,
            products,
        } => info!(categories, products, "Seeding complete"),
    }
    Ok(())
}
