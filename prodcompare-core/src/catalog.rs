//! Product catalog: loading, lookup, filtering, and admin product creation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

use crate::config::CatalogConfig;
use crate::error::{CatalogError, CompareError, Result};
use crate::persistence::atomic_write_json;
use crate::types::{ComparisonSet, Product, User};

/// Catalog listing filter. Empty fields match everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name or description.
    pub query: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub price_min: f64,
    pub price_max: f64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self::from_config(&CatalogConfig::default())
    }
}

impl ProductFilter {
    /// Filter with the configured default price range and nothing else set.
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            query: String::new(),
            category: None,
            brand: None,
            price_min: config.default_price_min,
            price_max: config.default_price_max,
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        let query = self.query.trim().to_lowercase();
        let matches_search = query.is_empty()
            || product.name.to_lowercase().contains(&query)
            || product.description.to_lowercase().contains(&query);
        let matches_category = self
            .category
            .as_deref()
            .is_none_or(|c| c.is_empty() || product.category == c);
        let matches_brand = self
            .brand
            .as_deref()
            .is_none_or(|b| b.is_empty() || product.brand == b);
        let matches_price = product.price >= self.price_min && product.price <= self.price_max;

        matches_search && matches_category && matches_brand && matches_price
    }
}

/// Admin form input for a new product. Numeric fields arrive as text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

impl ProductDraft {
    /// Validate the draft and turn it into a catalog product.
    ///
    /// Name, brand, category, and price are required; the price must be a
    /// positive number. New products start unrated and in stock, and get the
    /// placeholder image when no image was supplied.
    pub fn into_product(self, config: &CatalogConfig) -> std::result::Result<Product, CatalogError> {
        for (field, value) in [
            ("name", &self.name),
            ("brand", &self.brand),
            ("category", &self.category),
            ("price", &self.price),
        ] {
            if value.trim().is_empty() {
                return Err(CatalogError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        let price: f64 = self
            .price
            .trim()
            .replace(',', ".")
            .parse()
            .map_err(|_| CatalogError::InvalidPrice {
                value: self.price.clone(),
            })?;
        if !price.is_finite() || price <= 0.0 {
            return Err(CatalogError::InvalidPrice { value: self.price });
        }

        let images: Vec<String> = self
            .images
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        let images = if images.is_empty() {
            vec![config.placeholder_image.clone()]
        } else {
            images
        };

        Ok(Product {
            id: Uuid::new_v4().to_string(),
            name: self.name.trim().to_string(),
            brand: self.brand.trim().to_string(),
            category: self.category.trim().to_string(),
            price,
            rating: 0.0,
            review_count: 0,
            in_stock: self.in_stock.unwrap_or(true),
            description: self.description.trim().to_string(),
            images,
            specifications: self
                .specifications
                .into_iter()
                .filter(|(k, v)| !k.trim().is_empty() && !v.trim().is_empty())
                .collect(),
        })
    }
}

/// In-memory product catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog, validating every record and rejecting duplicate ids.
    pub fn new(products: Vec<Product>) -> std::result::Result<Self, CatalogError> {
        let mut catalog = Self::default();
        for product in products {
            catalog.insert(product)?;
        }
        Ok(catalog)
    }

    /// Load a catalog from a JSON array of products.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let products: Vec<Product> = serde_json::from_str(&data)?;
        let catalog = Self::new(products)?;
        tracing::info!(path = %path.display(), products = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Write the catalog back as a JSON array.
    pub fn save_json_file(&self, path: &Path) -> Result<()> {
        atomic_write_json(path, &self.products)?;
        tracing::debug!(path = %path.display(), products = self.len(), "catalog saved");
        Ok(())
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

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn insert(&mut self, product: Product) -> std::result::Result<(), CatalogError> {
        product.validate()?;
        if self.get(&product.id).is_some() {
            return Err(CatalogError::DuplicateProduct { id: product.id });
        }
        self.products.push(product);
        Ok(())
    }

    /// Products matching `filter`, in catalog order.
    pub fn filter(&self, filter: &ProductFilter) -> Vec<&Product> {
        self.products.iter().filter(|p| filter.matches(p)).collect()
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.distinct(|p| &p.category)
    }

    /// Distinct brands, sorted.
    pub fn brands(&self) -> Vec<String> {
        self.distinct(|p| &p.brand)
    }

    fn distinct(&self, field: impl Fn(&Product) -> &String) -> Vec<String> {
        let mut values: Vec<String> = self.products.iter().map(|p| field(p).clone()).collect();
        values.sort();
        values.dedup();
        values
    }

    /// Resolve selected ids into a comparison set, in selection order.
    /// Ids missing from the catalog are skipped.
    pub fn comparison_set(&self, ids: &[String]) -> std::result::Result<ComparisonSet, CatalogError> {
        let mut products = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get(id) {
                Some(p) => products.push(p.clone()),
                None => tracing::warn!(id = %id, "selected product not in catalog, skipping"),
            }
        }
        ComparisonSet::new(products)
    }

    /// Add a product from an admin draft. Only admins may add products.
    pub fn add_product(
        &mut self,
        actor: &User,
        draft: ProductDraft,
        config: &CatalogConfig,
    ) -> Result<&Product> {
        if !actor.is_admin() {
            return Err(CompareError::Session(crate::error::SessionError::AdminRequired));
        }
        let product = draft.into_product(config)?;
        tracing::info!(id = %product.id, actor = %actor.email, "product added");
        self.insert(product)?;
        let last = self.products.len() - 1;
        Ok(&self.products[last])
    }
}
