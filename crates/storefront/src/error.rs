//! Unified error handling with Sentry integration.
//!
//! Each module owns a focused error enum; [`StorefrontError`] aggregates
//! them for callers (such as the CLI) that drive several flows and just need
//! one error type. Unexpected failures are reported to Sentry through
//! [`capture`].

use thiserror::Error;

use crate::cart::{CartError, PersistenceError};
use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::data::DataError;
use crate::seed::SeedError;
use crate::services::auth::AuthError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Data service operation failed.
    #[error("Data service error: {0}")]
    Data(#[from] DataError),

    /// Catalog read failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cart mutation was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Cart session state could not be opened.
    #[error("Cart persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Identity resolution failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Seeding failed.
    #[error("Seed error: {0}")]
    Seed(#[from] SeedError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl StorefrontError {
    /// Whether the failure should be reported to Sentry.
    ///
    /// User mistakes and expected conditions (empty cart, not signed in,
    /// missing product) are not.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Data(_) | Self::Catalog(_) | Self::Seed(_) | Self::Persistence(_) => true,
            Self::Checkout(err) => err.is_reportable(),
            Self::Config(_)
            | Self::Cart(_)
            | Self::Auth(_)
            | Self::NotFound(_)
            | Self::BadRequest(_) => false,
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Report an error to Sentry and log it with the event id.
pub fn capture<E: std::error::Error + ?Sized>(error: &E, context: &str) {
    let event_id = sentry::capture_error(error);
    tracing::error!(
        error = %error,
        sentry_event_id = %event_id,
        "{context}"
    );
}

/// Set the Sentry user context from a user ID.
///
/// Call this after sign-in to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "p-1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storefront_error_display() {
        let err = StorefrontError::NotFound("product p-1".to_string());
        assert_eq!(err.to_string(), "Not found: product p-1");

        let err = StorefrontError::from(DataError::api("boom"));
        assert_eq!(err.to_string(), "Data service error: API errors: boom");
    }

    #[test]
    fn test_reportable_errors() {
        assert!(StorefrontError::from(DataError::api("boom")).is_reportable());
        assert!(!StorefrontError::from(CheckoutError::EmptyCart).is_reportable());
        assert!(!StorefrontError::from(CheckoutError::AuthenticationRequired).is_reportable());
        assert!(!StorefrontError::BadRequest("quantity".to_string()).is_reportable());
    }

    #[test]
    fn test_sentry_helpers_without_client() {
        // Without an initialized client these are no-ops and must not panic
        set_sentry_user(&"sub-1", Some("shopper@shopwave.test"));
        add_breadcrumb("checkout", "Order created", Some(&[("order_id", "o-1")]));
        clear_sentry_user();
        capture(&DataError::api("boom"), "Unexpected failure");
    }
}
