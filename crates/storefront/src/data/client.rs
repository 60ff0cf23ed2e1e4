//! HTTP client for the managed data service.
//!
//! Sends hand-written GraphQL documents as `graphql_client` query bodies
//! over `reqwest`. Reads use the public API key; writes use the signed-in
//! owner's token when one is attached.

use std::sync::Arc;

use graphql_client::{PathFragment, QueryBody, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use shopwave_core::{
    Category, NewCategory, NewOrder, NewOrderLine, NewProduct, Order, OrderId, OrderLine,
    OrderLineId, Product, ProductId,
};

use super::queries::{
    self, Connection, CreateCategoryData, CreateOrderData, CreateOrderItemData, CreateProductData,
    DeleteInput, DeleteOrderData, DeleteOrderItemData, GetProductData, IdVariables,
    InputVariables, ListCategoriesData, ListProductsData, ListVariables, Operation,
};
use super::{ApiError, DataError, DataService};
use crate::config::DataServiceConfig;

/// Page size used when walking `list*` connections to the end.
const PAGE_SIZE: u32 = 100;

/// Longest response body prefix copied into logs and errors.
const BODY_PREVIEW_CHARS: usize = 500;

// =============================================================================
// DataClient
// =============================================================================

/// Client for the managed data service's GraphQL endpoint.
///
/// Cheaply cloneable; clones share the underlying connection pool.
#[derive(Clone)]
pub struct DataClient {
    inner: Arc<DataClientInner>,
}

struct DataClientInner {
    client: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
    user_token: Option<SecretString>,
}

/// Which credential a request is made with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// Guest read access via the API key.
    Public,
    /// Owner access via the signed-in user's token.
    Owner,
}

impl DataClient {
    /// Create a new data service client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &DataServiceConfig) -> Result<Self, DataError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(DataClientInner {
                client,
                endpoint: config.endpoint.clone(),
                api_key: config.api_key.clone(),
                user_token: None,
            }),
        })
    }

    /// Return a client whose writes are made on behalf of the given user.
    #[must_use]
    pub fn with_user_token(&self, token: SecretString) -> Self {
        self.with_owner(Some(token))
    }

    fn with_owner(&self, user_token: Option<SecretString>) -> Self {
        Self {
            inner: Arc::new(DataClientInner {
                client: self.inner.client.clone(),
                endpoint: self.inner.endpoint.clone(),
                api_key: self.inner.api_key.clone(),
                user_token,
            }),
        }
    }

    /// The GraphQL endpoint this client talks to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Execute a GraphQL operation.
    async fn execute<V, T>(
        &self,
        operation: Operation,
        variables: V,
        access: Access,
    ) -> Result<T, DataError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let body = QueryBody {
            variables,
            query: operation.document,
            operation_name: operation.name,
        };

        let request = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&body);

        let request = match (access, &self.inner.user_token) {
            (Access::Owner, Some(token)) => {
                request.header(reqwest::header::AUTHORIZATION, token.expose_secret())
            }
            _ => request.header("x-api-key", self.inner.api_key.expose_secret()),
        };

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(DataError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;
        let preview = || {
            response_text
                .chars()
                .take(BODY_PREVIEW_CHARS)
                .collect::<String>()
        };

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = operation.name,
                body = %preview(),
                "Data service returned non-success status"
            );
            return Err(DataError::api(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: Response<T> = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                operation = operation.name,
                body = %preview(),
                "Failed to parse data service response"
            );
            DataError::Parse(e)
        })?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, operation = operation.name, "GraphQL errors in response");
            return Err(DataError::Api(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = operation.name,
                body = %preview(),
                "Data service response has no data and no errors"
            );
            DataError::api("No data in response")
        })
    }

    /// Walk a `list*` connection. With a `limit`, only the first page is read.
    async fn list_records<D, T>(
        &self,
        operation: Operation,
        limit: Option<u32>,
        extract: fn(D) -> Connection<T>,
    ) -> Result<Vec<T>, DataError>
    where
        D: DeserializeOwned,
    {
        let mut records = Vec::new();
        let mut next_token = None;

        loop {
            let variables = ListVariables {
                limit: Some(limit.unwrap_or(PAGE_SIZE)),
                next_token,
            };
            let mut page = extract(self.execute(operation, variables, Access::Public).await?);
            next_token = page.next_token.take();
            records.extend(page.into_items());

            if limit.is_some() || next_token.is_none() {
                break;
            }
            debug!(operation = operation.name, fetched = records.len(), "Fetching next page");
        }

        Ok(records)
    }
}

fn convert_graphql_error(error: graphql_client::Error) -> ApiError {
    ApiError {
        error_type: error
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("errorType"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        path: error.path.map_or_else(Vec::new, |path| {
            path.into_iter()
                .map(|fragment| match fragment {
                    PathFragment::Key(key) => key,
                    PathFragment::Index(index) => index.to_string(),
                })
                .collect()
        }),
        message: error.message,
    }
}

fn missing_record(operation: Operation) -> DataError {
    DataError::api(format!("{} returned no record", operation.name))
}

impl DataService for DataClient {
    fn for_owner(&self, token: Option<&SecretString>) -> Self {
        self.with_owner(token.cloned())
    }

    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, DataError> {
        let products = self
            .list_records(queries::LIST_PRODUCTS, None, |data: ListProductsData| {
                data.list_products
            })
            .await?;
        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, DataError> {
        let data: GetProductData = self
            .execute(
                queries::GET_PRODUCT,
                IdVariables { id: id.as_str() },
                Access::Public,
            )
            .await?;
        Ok(data.get_product)
    }

    #[instrument(skip(self))]
    async fn list_categories(&self, limit: Option<u32>) -> Result<Vec<Category>, DataError> {
        self.list_records(queries::LIST_CATEGORIES, limit, |data: ListCategoriesData| {
            data.list_categories
        })
        .await
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_category(&self, input: NewCategory) -> Result<Category, DataError> {
        let data: CreateCategoryData = self
            .execute(
                queries::CREATE_CATEGORY,
                InputVariables { input },
                Access::Owner,
            )
            .await?;
        data.create_category
            .ok_or_else(|| missing_record(queries::CREATE_CATEGORY))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_product(&self, input: NewProduct) -> Result<Product, DataError> {
        let data: CreateProductData = self
            .execute(
                queries::CREATE_PRODUCT,
                InputVariables { input },
                Access::Owner,
            )
            .await?;
        data.create_product
            .ok_or_else(|| missing_record(queries::CREATE_PRODUCT))
    }

    #[instrument(skip(self, input), fields(user_id = %input.user_id, total = %input.total))]
    async fn create_order(&self, input: NewOrder) -> Result<Order, DataError> {
        let data: CreateOrderData = self
            .execute(queries::CREATE_ORDER, InputVariables { input }, Access::Owner)
            .await?;
        data.create_order
            .ok_or_else(|| missing_record(queries::CREATE_ORDER))
    }

    #[instrument(
        skip(self, input),
        fields(order_id = %input.order_id, product_id = %input.product_id)
    )]
    async fn create_order_line(&self, input: NewOrderLine) -> Result<OrderLine, DataError> {
        let data: CreateOrderItemData = self
            .execute(
                queries::CREATE_ORDER_ITEM,
                InputVariables { input },
                Access::Owner,
            )
            .await?;
        data.create_order_item
            .ok_or_else(|| missing_record(queries::CREATE_ORDER_ITEM))
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn delete_order(&self, id: &OrderId) -> Result<(), DataError> {
        let data: DeleteOrderData = self
            .execute(
                queries::DELETE_ORDER,
                InputVariables {
                    input: DeleteInput { id: id.as_str() },
                },
                Access::Owner,
            )
            .await?;
        let deleted = data
            .delete_order
            .ok_or_else(|| missing_record(queries::DELETE_ORDER))?;
        debug!(deleted = %deleted.id, "Deleted order");
        Ok(())
    }

    #[instrument(skip(self), fields(order_line_id = %id))]
    async fn delete_order_line(&self, id: &OrderLineId) -> Result<(), DataError> {
        let data: DeleteOrderItemData = self
            .execute(
                queries::DELETE_ORDER_ITEM,
                InputVariables {
                    input: DeleteInput { id: id.as_str() },
                },
                Access::Owner,
            )
            .await?;
        let deleted = data
            .delete_order_item
            .ok_or_else(|| missing_record(queries::DELETE_ORDER_ITEM))?;
        debug!(deleted = %deleted.id, "Deleted order line");
        Ok(())
    }
}
