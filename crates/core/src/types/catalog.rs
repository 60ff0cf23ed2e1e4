//! Catalog records: products and categories.

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;

/// A product as exposed by the data service.
///
/// `price` and `inventory` are always present; an inventory of zero means
/// the product is out of stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Price,
    pub inventory: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Product {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.inventory > 0
    }

    /// Stock label shown next to the price.
    #[must_use]
    pub fn stock_label(&self) -> String {
        if self.in_stock() {
            format!("{} in stock", self.inventory)
        } else {
            "Out of stock".to_string()
        }
    }

    /// The product image, or a sized placeholder when none is set.
    #[must_use]
    pub fn image_or_placeholder(&self, width: u32, height: u32) -> String {
        self.image_url.clone().unwrap_or_else(|| {
            format!(
                "https://source.unsplash.com/random/{width}x{height}?product={}",
                self.id
            )
        })
    }

    /// Whether the product belongs to the given category.
    #[must_use]
    pub fn in_category(&self, category_id: &CategoryId) -> bool {
        self.category_id.as_ref() == Some(category_id)
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Price,
    pub inventory: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl NewProduct {
    /// Attach the service-assigned id.
    #[must_use]
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            inventory: self.inventory,
            category_id: self.category_id,
            image_url: self.image_url,
        }
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headphones(inventory: u32) -> Product {
        Product {
            id: ProductId::new("p-1"),
            name: "Wireless Headphones".to_string(),
            description: None,
            price: Price::from_cents(19999).unwrap(),
            inventory,
            category_id: Some(CategoryId::new("c-electronics")),
            image_url: None,
        }
    }

    #[test]
    fn test_stock_label() {
        assert_eq!(headphones(45).stock_label(), "45 in stock");
        assert_eq!(headphones(0).stock_label(), "Out of stock");
        assert!(!headphones(0).in_stock());
    }

    #[test]
    fn test_image_placeholder() {
        let mut product = headphones(1);
        assert_eq!(
            product.image_or_placeholder(100, 100),
            "https://source.unsplash.com/random/100x100?product=p-1"
        );
        product.image_url = Some("https://img.example/h.jpg".to_string());
        assert_eq!(product.image_or_placeholder(100, 100), "https://img.example/h.jpg");
    }

    #[test]
    fn test_deserialize_wire_record() {
        let json = r#"{
            "id": "p-9",
            "name": "Bestselling Novel",
            "description": null,
            "price": 14.99,
            "inventory": 200,
            "categoryId": "c-books",
            "imageUrl": null
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.price, Price::from_cents(1499).unwrap());
        assert!(product.in_category(&CategoryId::new("c-books")));
        assert!(product.description.is_none());
    }

    #[test]
    fn test_deserialize_string_price_and_reject_negative() {
        let json = r#"{"id": "p-2", "name": "Coffee Maker", "price": "89.99", "inventory": 15}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.price, Price::from_cents(8999).unwrap());
        assert!(product.category_id.is_none());

        let json = r#"{"id": "p-3", "name": "x", "price": -0.5, "inventory": 1}"#;
        assert!(serde_json::from_str::<Product>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_negative_inventory() {
        let json = r#"{"id": "p", "name": "x", "price": 1, "inventory": -1}"#;
        assert!(serde_json::from_str::<Product>(json).is_err());
    }
}
