//! GraphQL documents and response shapes for the generated record API.
//!
//! The service generates one operation per record type and verb. Selection
//! sets list exactly the fields the core records deserialize.

use serde::{Deserialize, Serialize};

use shopwave_core::{Category, Order, OrderLine, Product};

/// A named GraphQL operation.
#[derive(Debug, Clone, Copy)]
pub struct Operation {
    pub name: &'static str,
    pub document: &'static str,
}

macro_rules! operation {
    ($name:literal, $document:expr) => {
        Operation {
            name: $name,
            document: $document,
        }
    };
}

pub const LIST_PRODUCTS: Operation = operation!(
    "ListProducts",
    concat!(
        "query ListProducts($limit: Int, $nextToken: String) { ",
        "listProducts(limit: $limit, nextToken: $nextToken) { ",
        "items { id name description price inventory categoryId imageUrl } nextToken } }"
    )
);

pub const GET_PRODUCT: Operation = operation!(
    "GetProduct",
    concat!(
        "query GetProduct($id: ID!) { ",
        "getProduct(id: $id) { id name description price inventory categoryId imageUrl } }"
    )
);

pub const LIST_CATEGORIES: Operation = operation!(
    "ListCategories",
    concat!(
        "query ListCategories($limit: Int, $nextToken: String) { ",
        "listCategories(limit: $limit, nextToken: $nextToken) { ",
        "items { id name } nextToken } }"
    )
);

pub const CREATE_CATEGORY: Operation = operation!(
    "CreateCategory",
    concat!(
        "mutation CreateCategory($input: CreateCategoryInput!) { ",
        "createCategory(input: $input) { id name } }"
    )
);

pub const CREATE_PRODUCT: Operation = operation!(
    "CreateProduct",
    concat!(
        "mutation CreateProduct($input: CreateProductInput!) { ",
        "createProduct(input: $input) { id name description price inventory categoryId imageUrl } }"
    )
);

pub const CREATE_ORDER: Operation = operation!(
    "CreateOrder",
    concat!(
        "mutation CreateOrder($input: CreateOrderInput!) { ",
        "createOrder(input: $input) { id userId total status createdAt } }"
    )
);

pub const CREATE_ORDER_ITEM: Operation = operation!(
    "CreateOrderItem",
    concat!(
        "mutation CreateOrderItem($input: CreateOrderItemInput!) { ",
        "createOrderItem(input: $input) { id orderId productId quantity price } }"
    )
);

pub const DELETE_ORDER: Operation = operation!(
    "DeleteOrder",
    "mutation DeleteOrder($input: DeleteOrderInput!) { deleteOrder(input: $input) { id } }"
);

pub const DELETE_ORDER_ITEM: Operation = operation!(
    "DeleteOrderItem",
    "mutation DeleteOrderItem($input: DeleteOrderItemInput!) { deleteOrderItem(input: $input) { id } }"
);

// =============================================================================
// Variables
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVariables {
    pub limit: Option<u32>,
    pub next_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IdVariables<'a> {
    pub id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct InputVariables<T> {
    pub input: T,
}

#[derive(Debug, Serialize)]
pub struct DeleteInput<'a> {
    pub id: &'a str,
}

// =============================================================================
// Response data
// =============================================================================

/// One page of a generated `list*` query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<Option<T>>,
    #[serde(default)]
    pub next_token: Option<String>,
}

impl<T> Connection<T> {
    /// Items with null entries (records hidden by authorization) dropped.
    pub fn into_items(self) -> Vec<T> {
        self.items.into_iter().flatten().collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsData {
    pub list_products: Connection<Product>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetProductData {
    pub get_product: Option<Product>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCategoriesData {
    pub list_categories: Connection<Category>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryData {
    pub create_category: Option<Category>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductData {
    pub create_product: Option<Product>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderData {
    pub create_order: Option<Order>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItemData {
    pub create_order_item: Option<OrderLine>,
}

#[derive(Debug, Deserialize)]
pub struct DeletedRecord {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOrderData {
    pub delete_order: Option<DeletedRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOrderItemData {
    pub delete_order_item: Option<DeletedRecord>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PRODUCT_FIELDS: &str = "id name description price inventory categoryId imageUrl";
    const ORDER_FIELDS: &str = "id userId total status createdAt";
    const ORDER_ITEM_FIELDS: &str = "id orderId productId quantity price";

    #[test]
    fn test_documents_select_record_fields() {
        assert!(LIST_PRODUCTS.document.contains(PRODUCT_FIELDS));
        assert!(GET_PRODUCT.document.contains(PRODUCT_FIELDS));
        assert!(CREATE_PRODUCT.document.contains(PRODUCT_FIELDS));
        assert!(CREATE_ORDER.document.contains(ORDER_FIELDS));
        assert!(CREATE_ORDER_ITEM.document.contains(ORDER_ITEM_FIELDS));
    }

    #[test]
    fn test_connection_drops_null_items() {
        let json = r#"{
            "listCategories": {
                "items": [{"id": "c-1", "name": "Books"}, null],
                "nextToken": null
            }
        }"#;
        let data: ListCategoriesData = serde_json::from_str(json).unwrap();
        assert!(data.list_categories.next_token.is_none());
        let items = data.list_categories.into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().name, "Books");
    }

    #[test]
    fn test_list_variables_wire_names() {
        let vars = ListVariables {
            limit: Some(1),
            next_token: Some("abc".to_string()),
        };
        let value = serde_json::to_value(&vars).unwrap();
        assert_eq!(value["limit"], 1);
        assert_eq!(value["nextToken"], "abc");
    }
}
