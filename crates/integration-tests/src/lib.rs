//! Integration tests for ShopWave.
//!
//! Tests drive catalog, cart and checkout together against the in-process
//! data service, so no backend is needed:
//!
//! ```bash
//! cargo test -p shopwave-integration-tests
//! ```
//!
//! This module holds the shared fixtures.

use secrecy::SecretString;
use tempfile::TempDir;

use shopwave_core::{Product, ProductId, UserId};
use shopwave_storefront::data::MemoryDataService;
use shopwave_storefront::seed::{SeedCatalog, SeedError};
use shopwave_storefront::services::auth::{AuthenticatedUser, SessionIdentity};

/// Data service holding the starter catalog with name-derived ids
/// (e.g. `wireless-headphones`).
///
/// # Errors
///
/// Returns an error if the built-in catalog fails to load.
pub fn starter_service() -> Result<MemoryDataService, SeedError> {
    let (categories, products) = SeedCatalog::default_catalog()?.to_records()?;
    Ok(MemoryDataService::with_catalog(categories, products))
}

/// Look up a product in the in-process service.
#[must_use]
pub fn product(data: &MemoryDataService, id: &str) -> Option<Product> {
    let id = ProductId::new(id);
    data.products().into_iter().find(|p| p.id == id)
}

/// A session with `user_id` signed in.
#[must_use]
pub fn signed_in(user_id: &str) -> SessionIdentity {
    SessionIdentity::signed_in(AuthenticatedUser::new(UserId::new(user_id)))
}

/// A session whose user carries an access token.
#[must_use]
pub fn signed_in_with_token(user_id: &str, token: &str) -> SessionIdentity {
    SessionIdentity::signed_in(
        AuthenticatedUser::new(UserId::new(user_id)).with_token(SecretString::from(token)),
    )
}

/// A fresh directory under the system temp dir, removed on drop.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn scratch_dir(prefix: &str) -> std::io::Result<TempDir> {
    tempfile::Builder::new().prefix(prefix).tempdir()
}
