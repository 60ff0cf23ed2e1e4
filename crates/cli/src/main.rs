//! ShopWave CLI - browse the catalog, manage a cart and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Load the starter catalog into an empty data service
//! shopwave seed
//!
//! # Browse
//! shopwave products list --sort price-low
//! shopwave products show <PRODUCT_ID>
//!
//! # Cart (kept per session under SHOPWAVE_SESSION_DIR)
//! shopwave cart add <PRODUCT_ID> --quantity 2
//! shopwave cart show
//!
//! # Place the order (requires SHOPWAVE_USER_ID)
//! shopwave checkout
//!
//! # Everything above also works without a backend
//! shopwave --offline products list
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopwave_storefront::catalog::ProductSort;
use shopwave_storefront::config::StorefrontConfig;
use shopwave_storefront::error::{Result, StorefrontError, capture};

mod commands;

use commands::Session;

#[derive(Parser)]
#[command(name = "shopwave")]
#[command(author, version, about = "ShopWave storefront CLI")]
struct Cli {
    /// Cart session name
    #[arg(long, global = true, default_value = "default")]
    session: String,

    /// Use the in-process data service with the starter catalog
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Browse categories
    Categories {
        #[command(subcommand)]
        action: CategoriesAction,
    },
    /// Manage the session cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart
    Checkout {
        /// Keep a partially written order instead of rolling it back
        #[arg(long)]
        leave_dangling: bool,
    },
    /// Load a catalog into an empty data service
    Seed {
        /// YAML catalog (defaults to the built-in starter catalog)
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Show who is signed in
    Whoami,
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Sort order (`name`, `price-low`, `price-high`)
        #[arg(short, long, default_value = "name")]
        sort: ProductSort,
    },
    /// Show the featured products
    Featured,
    /// Show one product
    Show {
        /// Product id
        id: String,
    },
}

#[derive(Subcommand)]
enum CategoriesAction {
    /// List categories
    List,
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product
    Add {
        /// Product id
        id: String,

        /// Quantity (clamped to the product's inventory)
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a product's quantity (0 removes it)
    Update {
        /// Product id
        id: String,
        /// New quantity
        quantity: u32,
    },
    /// Remove a product
    Remove {
        /// Product id
        id: String,
    },
    /// Show the cart and order summary
    Show,
    /// Empty the cart
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopwave_storefront=info,shopwave_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = if cli.offline {
        StorefrontConfig::offline_from_env()
    } else {
        StorefrontConfig::from_env()
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(StorefrontError::from(e)),
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}

fn report(error: &StorefrontError) {
    if let StorefrontError::Checkout(checkout) = error {
        if checkout.requires_sign_in() {
            tracing::error!("Sign in to place your order (set SHOPWAVE_USER_ID)");
            return;
        }
        if let Some(message) = checkout.user_message() {
            tracing::error!("{message}");
        }
    }

    if error.is_reportable() {
        capture(error, "Command failed");
    } else {
        tracing::error!("Command failed: {error}");
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<()> {
    if cli.offline {
        let session = Session::offline(&config, &cli.session)?;
        dispatch(cli.command, session).await
    } else {
        let session = Session::remote(&config, &cli.session)?;
        dispatch(cli.command, session).await
    }
}

async fn dispatch<D>(command: Commands, mut session: Session<D>) -> Result<()>
where
    D: shopwave_storefront::data::DataService,
{
    match command {
        Commands::Products { action } => match action {
            ProductsAction::List { category, sort } => {
                commands::catalog::list_products(&session, category, sort).await
            }
            ProductsAction::Featured => commands::catalog::featured_products(&session).await,
            ProductsAction::Show { id } => commands::catalog::show_product(&session, &id).await,
        },
        Commands::Categories {
            action: CategoriesAction::List,
        } => commands::catalog::list_categories(&session).await,
        Commands::Cart { action } => match action {
            CartAction::Add { id, quantity } => {
                commands::cart::add(&mut session, &id, quantity).await
            }
            CartAction::Update { id, quantity } => {
                commands::cart::update(&mut session, &id, quantity);
                Ok(())
            }
            CartAction::Remove { id } => {
                commands::cart::remove(&mut session, &id);
                Ok(())
            }
            CartAction::Show => {
                commands::cart::show(&session);
                Ok(())
            }
            CartAction::Clear => {
                commands::cart::clear(&mut session);
                Ok(())
            }
        },
        Commands::Checkout { leave_dangling } => {
            commands::checkout::place_order(&mut session, leave_dangling).await
        }
        Commands::Seed { file } => commands::seed::catalog(&session, file.as_deref()).await,
        Commands::Whoami => {
            commands::whoami(&session).await;
            Ok(())
        }
    }
}
