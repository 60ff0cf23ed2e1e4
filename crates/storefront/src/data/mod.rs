//! Managed data service boundary.
//!
//! # Architecture
//!
//! - The data service is a schema-driven GraphQL backend that generates
//!   `list`/`get`/`create`/`delete` operations for each record type and
//!   enforces owner-based authorization
//! - [`DataService`] is the seam the catalog, checkout and seeding flows are
//!   written against
//! - [`DataClient`] talks to the real service over HTTP
//! - [`MemoryDataService`] keeps records in process for tests and offline use
//!
//! # Example
//!
//! ```rust,ignore
//! use shopwave_storefront::data::{DataClient, DataService};
//!
//! let client = DataClient::new(config.data_service()?)?;
//! let products = client.list_products().await?;
//! ```

mod client;
mod memory;
mod queries;

pub use client::DataClient;
pub use memory::{MemoryDataService, Write};

use std::future::Future;

use secrecy::SecretString;
use shopwave_core::{
    Category, NewCategory, NewOrder, NewOrderLine, NewProduct, Order, OrderId, OrderLine,
    OrderLineId, Product, ProductId,
};
use thiserror::Error;

/// Record operations exposed by the managed data service.
///
/// Reads are public (guest access); writes are made on behalf of the
/// signed-in owner.
pub trait DataService: Send + Sync {
    /// A handle to the same service whose writes are authorized with the
    /// owner's access token. `None` drops any owner credential, leaving
    /// only guest access.
    #[must_use]
    fn for_owner(&self, token: Option<&SecretString>) -> Self
    where
        Self: Sized;

    /// List every product.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, DataError>> + Send;

    /// Get a product by id; `None` when it does not exist.
    fn get_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Option<Product>, DataError>> + Send;

    /// List categories, optionally capped at `limit` records.
    fn list_categories(
        &self,
        limit: Option<u32>,
    ) -> impl Future<Output = Result<Vec<Category>, DataError>> + Send;

    /// Create a category.
    fn create_category(
        &self,
        input: NewCategory,
    ) -> impl Future<Output = Result<Category, DataError>> + Send;

    /// Create a product.
    fn create_product(
        &self,
        input: NewProduct,
    ) -> impl Future<Output = Result<Product, DataError>> + Send;

    /// Create an order header.
    fn create_order(&self, input: NewOrder)
    -> impl Future<Output = Result<Order, DataError>> + Send;

    /// Create an order line.
    fn create_order_line(
        &self,
        input: NewOrderLine,
    ) -> impl Future<Output = Result<OrderLine, DataError>> + Send;

    /// Delete an order header.
    fn delete_order(&self, id: &OrderId) -> impl Future<Output = Result<(), DataError>> + Send;

    /// Delete an order line.
    fn delete_order_line(
        &self,
        id: &OrderLineId,
    ) -> impl Future<Output = Result<(), DataError>> + Send;
}

/// Errors that can occur when talking to the data service.
#[derive(Debug, Error)]
pub enum DataError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with error descriptors.
    #[error("API errors: {}", format_api_errors(.0))]
    Api(Vec<ApiError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Record not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl DataError {
    /// Build an `Api` error from a single message.
    #[must_use]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api(vec![ApiError::new(message)])
    }

    /// The representative message: the first descriptor's message for API
    /// errors, the display string otherwise.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Api(errors) => errors
                .first()
                .map_or_else(|| format_api_errors(errors), |e| e.message.clone()),
            other => other.to_string(),
        }
    }
}

/// An error descriptor returned by the data service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Error message.
    pub message: String,
    /// Service-specific error type (e.g. `Unauthorized`).
    pub error_type: Option<String>,
    /// Path to the failing field in the response.
    pub path: Vec<String>,
}

impl ApiError {
    /// Create a descriptor with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
            path: Vec::new(),
        }
    }
}

fn format_api_errors(errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();
            if let Some(error_type) = &e.error_type {
                parts.push(format!("[{error_type}]"));
            }
            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }
            if !e.path.is_empty() {
                parts.push(format!("path: {}", e.path.join(".")));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = DataError::NotFound("product p-1".to_string());
        assert_eq!(err.to_string(), "Not found: product p-1");
    }

    #[test]
    fn test_first_descriptor_is_representative() {
        let err = DataError::Api(vec![
            ApiError::new("Not Authorized to access createOrder"),
            ApiError::new("second"),
        ]);
        assert_eq!(err.message(), "Not Authorized to access createOrder");
        assert_eq!(
            err.to_string(),
            "API errors: Not Authorized to access createOrder; second"
        );
    }

    #[test]
    fn test_api_error_with_type_and_path() {
        let err = DataError::Api(vec![ApiError {
            message: "Conditional request failed".to_string(),
            error_type: Some("DynamoDB:ConditionalCheckFailedException".to_string()),
            path: vec!["createOrderItem".to_string()],
        }]);
        assert_eq!(
            err.to_string(),
            "API errors: [DynamoDB:ConditionalCheckFailedException] Conditional request failed path: createOrderItem"
        );
    }

    #[test]
    fn test_api_error_no_details() {
        let err = DataError::Api(vec![ApiError::new("")]);
        assert_eq!(err.to_string(), "API errors: [error 1]: (no details)");

        let err = DataError::Api(vec![]);
        assert_eq!(err.to_string(), "API errors: (no error details provided)");
        assert_eq!(err.message(), "(no error details provided)");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = DataError::RateLimited(30);
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");
    }
}
