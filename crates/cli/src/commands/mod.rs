//! Command implementations.
//!
//! Each command runs against a [`Session`]: one data service, the signed-in
//! identity and the session's cart.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod seed;

use rust_decimal::Decimal;
use tracing::info;

use shopwave_storefront::cart::{CartStore, FileCartPersistence};
use shopwave_storefront::catalog::CatalogClient;
use shopwave_storefront::config::StorefrontConfig;
use shopwave_storefront::data::{DataClient, DataService, MemoryDataService};
use shopwave_storefront::error::Result;
use shopwave_storefront::seed::SeedCatalog;
use shopwave_storefront::services::auth::{IdentityProvider, SessionIdentity};

/// Everything a command needs.
pub struct Session<D> {
    pub catalog: CatalogClient<D>,
    pub identity: SessionIdentity,
    pub cart: CartStore<FileCartPersistence>,
    pub tax_rate: Decimal,
}

impl<D: DataService> Session<D> {
    fn open(config: &StorefrontConfig, name: &str, data: D) -> Result<Self> {
        let identity = SessionIdentity::from_config(&config.auth)?;
        let persistence = FileCartPersistence::new(&config.session_dir, name)?;

        Ok(Self {
            catalog: CatalogClient::new(data),
            identity,
            cart: CartStore::open(persistence),
            tax_rate: config.tax_rate,
        })
    }

    pub const fn data(&self) -> &D {
        self.catalog.data()
    }

    /// The data service with writes made as the signed-in user, or with
    /// guest access when nobody is signed in.
    pub async fn owner_data(&self) -> D {
        let user = self.identity.current_user().await.ok();
        self.data()
            .for_owner(user.as_ref().and_then(|user| user.token.as_ref()))
    }
}

impl Session<DataClient> {
    /// Session against the managed data service.
    pub fn remote(config: &StorefrontConfig, name: &str) -> Result<Self> {
        let client = DataClient::new(config.data_service()?)?;
        Self::open(config, name, client)
    }
}

impl Session<MemoryDataService> {
    /// Session against an in-process service holding the starter catalog.
    ///
    /// Ids are derived from names so carts survive between invocations.
    pub fn offline(config: &StorefrontConfig, name: &str) -> Result<Self> {
        let (categories, products) = SeedCatalog::default_catalog()?.to_records()?;
        Self::open(
            config,
            name,
            MemoryDataService::with_catalog(categories, products),
        )
    }
}

/// Print the header greeting.
pub async fn whoami<D: DataService>(session: &Session<D>) {
    match session.identity.current_user().await {
        Ok(user) => info!("{}", user.greeting()),
        Err(_) => info!("Not signed in"),
    }
}
