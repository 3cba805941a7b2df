//! Core types for ProductCompare.
//!
//! Defines the product record, the comparison set and its rows, and the
//! user/comment records used by the surrounding stores and session service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CatalogError;

/// Maximum number of products shown side by side.
pub const MAX_COMPARED_PRODUCTS: usize = 4;

/// Rendered placeholder for a specification a product does not declare.
pub const UNKNOWN_VALUE: &str = "—";

/// Image shown when a product has no images of its own.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg?height=400&width=400";

/// A catalog product as supplied by the external catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

impl Product {
    /// First image, or the placeholder when the product has none.
    pub fn primary_image(&self) -> &str {
        self.images
            .first()
            .map(String::as_str)
            .filter(|url| !url.is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// Specification value for `label`, or the unknown sentinel.
    pub fn spec_or_unknown(&self, label: &str) -> &str {
        self.specifications
            .get(label)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .unwrap_or(UNKNOWN_VALUE)
    }

    /// Check the numeric invariants of a catalog record.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::MissingField { field: "id".into() });
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CatalogError::InvalidProduct {
                id: self.id.clone(),
                reason: format!("price must be non-negative, got {}", self.price),
            });
        }
        if !self.rating.is_finite() || !(0.0..=5.0).contains(&self.rating) {
            return Err(CatalogError::InvalidProduct {
                id: self.id.clone(),
                reason: format!("rating must be within 0-5, got {}", self.rating),
            });
        }
        Ok(())
    }
}

/// Ordered set of products under comparison. Column order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonSet {
    products: Vec<Product>,
}

impl ComparisonSet {
    /// Build a comparison set, rejecting more than [`MAX_COMPARED_PRODUCTS`].
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        if products.len() > MAX_COMPARED_PRODUCTS {
            return Err(CatalogError::TooManyProducts {
                max: MAX_COMPARED_PRODUCTS,
                actual: products.len(),
            });
        }
        Ok(Self { products })
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Union of specification labels in first-discovery order: product 0's
    /// labels first, then labels first introduced by product 1, and so on.
    ///
    /// Labels within one product follow the map's sorted key order.
    pub fn spec_labels(&self) -> Vec<String> {
        spec_labels(&self.products)
    }
}

/// Union of specification labels across `products` in first-discovery order.
pub fn spec_labels(products: &[Product]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for product in products {
        for key in product.specifications.keys() {
            if !labels.iter().any(|existing| existing == key) {
                labels.push(key.clone());
            }
        }
    }
    labels
}

/// Per-cell ranking outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Best,
    Worst,
    Neutral,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Best => write!(f, "best"),
            Classification::Worst => write!(f, "worst"),
            Classification::Neutral => write!(f, "neutral"),
        }
    }
}

/// Which attribute a comparison row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowKind {
    Image,
    Name,
    Brand,
    Price,
    Rating,
    InStock,
    Specification,
}

impl RowKind {
    /// Rows kept by the hide-identical filter regardless of their values.
    pub fn is_anchor(self) -> bool {
        matches!(self, RowKind::Image | RowKind::Name)
    }
}

/// One attribute across every compared product, index-aligned with the set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub key: String,
    pub label: String,
    pub kind: RowKind,
    pub values: Vec<String>,
    pub is_different: bool,
    pub classifications: Vec<Classification>,
}

/// Account role. Admins may add products to the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Buyer,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Buyer => write!(f, "buyer"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// A catalog user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A buyer review attached to a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub product_id: String,
    pub author: String,
    pub text: String,
    pub rating: u8,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, specs: &[(&str, &str)]) -> Product {
        Product {
            id: id.into(),
            name: format!("Product {id}"),
            brand: "Acme".into(),
            category: "Смартфоны".into(),
            price: 1000.0,
            rating: 4.0,
            review_count: 0,
            in_stock: true,
            description: String::new(),
            images: vec![],
            specifications: specs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_primary_image_falls_back_to_placeholder() {
        let mut p = product("a", &[]);
        assert_eq!(p.primary_image(), PLACEHOLDER_IMAGE);
        p.images.push("/img/a.png".into());
        assert_eq!(p.primary_image(), "/img/a.png");
    }

    #[test]
    fn test_spec_or_unknown() {
        let p = product("a", &[("Вес", "180 г")]);
        assert_eq!(p.spec_or_unknown("Вес"), "180 г");
        assert_eq!(p.spec_or_unknown("Камера"), UNKNOWN_VALUE);
    }

    #[test]
    fn test_comparison_set_rejects_more_than_four() {
        let products: Vec<Product> = (0..5).map(|i| product(&i.to_string(), &[])).collect();
        let err = ComparisonSet::new(products).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::TooManyProducts { max: 4, actual: 5 }
        ));
    }

    #[test]
    fn test_spec_labels_first_discovery_order() {
        let set = ComparisonSet::new(vec![
            product("a", &[("Вес", "180 г"), ("Батарея", "4000 мАч")]),
            product("b", &[("Камера", "48 Мп"), ("Вес", "200 г")]),
        ])
        .unwrap();
        assert_eq!(set.spec_labels(), vec!["Батарея", "Вес", "Камера"]);
    }

    #[test]
    fn test_product_validate() {
        let mut p = product("a", &[]);
        assert!(p.validate().is_ok());
        p.rating = 5.5;
        assert!(p.validate().is_err());
        p.rating = 4.0;
        p.price = -1.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_product_deserializes_camel_case() {
        let json = r#"{
            "id": "1", "name": "Phone", "brand": "Acme", "category": "Смартфоны",
            "price": 49990, "rating": 4.7, "reviewCount": 12, "inStock": false,
            "description": "", "images": [], "specifications": {"Вес": "180 г"}
        }"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.review_count, 12);
        assert!(!p.in_stock);
        assert_eq!(p.specifications["Вес"], "180 г");
    }

    #[test]
    fn test_classification_serializes_lowercase() {
        let json = serde_json::to_string(&Classification::Best).unwrap();
        assert_eq!(json, "\"best\"");
        assert_eq!(Classification::Worst.to_string(), "worst");
    }
}
