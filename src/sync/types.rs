//! Catalog import record and result types.

use serde::{Deserialize, Serialize};

use crate::model::{Product, ProductStatus};
use crate::validate::normalize_status;

/// One line of a catalog JSONL file.
///
/// Only `title` and `price` are required. A missing `id` gets a fresh
/// UUID; a missing `status` means draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(rename = "type", default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub price: f64,
    #[serde(default)]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub sale_duration: Option<i64>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub subcategory_id: Option<String>,
    /// Unix milliseconds; defaults to import time.
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl ProductRecord {
    /// Validate and convert into a stored product.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn into_product(self, now_ms: i64) -> Result<Product, String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".into());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!("price must be a non-negative number, got {}", self.price));
        }
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(format!("rating must be between 0 and 5, got {}", self.rating));
        }

        let status = match self.status.as_deref() {
            None => ProductStatus::Draft,
            Some(raw) => normalize_status(raw).map_err(|(input, suggestion)| match suggestion {
                Some(s) => format!("unknown status '{input}' (did you mean '{s}'?)"),
                None => format!("unknown status '{input}'"),
            })?,
        };

        let mut product = Product::new(self.title.trim(), self.price);
        if let Some(id) = self.id.filter(|id| !id.trim().is_empty()) {
            product.id = id;
        } else {
            product.id = uuid::Uuid::new_v4().to_string();
        }
        if let Some(product_type) = self.product_type {
            product.product_type = product_type;
        }
        product.images = self.images;
        product.sale_price = self.sale_price;
        product.sale_duration = self.sale_duration;
        product.stock = self.stock;
        product.rating = self.rating;
        product.short_description = self.short_description;
        product.long_description = self.long_description;
        product.status = status;
        product.category_id = self.category_id;
        product.subcategory_id = self.subcategory_id;
        product.created_at = self.created_at.unwrap_or(now_ms);
        product.updated_at = now_ms;
        Ok(product)
    }
}

/// Outcome counts of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub created: usize,
    pub updated: usize,
    /// Updated products whose text changed, dropping their embedding.
    pub embeddings_invalidated: usize,
}

impl ImportStats {
    #[must_use]
    pub fn total(&self) -> usize {
        self.created + self.updated
    }
}

/// Errors raised while importing.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("JSONL file not found: {0}")]
    FileNotFound(String),

    /// Invalid record format or content.
    #[error("Invalid record at line {line}: {message}")]
    InvalidRecord {
        /// 1-based line number.
        line: usize,
        message: String,
    },
}

impl From<crate::error::Error> for SyncError {
    fn from(err: crate::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type for import operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> ProductRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_minimal_record_gets_defaults() {
        let product = record(r#"{"title":"Mug","price":9.5}"#).into_product(1_000).unwrap();
        assert_eq!(product.status, ProductStatus::Draft);
        assert_eq!(product.product_type, "physical");
        assert_eq!(product.created_at, 1_000);
        assert_eq!(product.id.len(), 36);
    }

    #[test]
    fn test_record_keeps_id_and_normalizes_status() {
        let product = record(
            r#"{"id":"p1","title":"Mug","price":9.5,"status":"published","categoryId":"kitchen","createdAt":5}"#,
        )
        .into_product(1_000)
        .unwrap();
        assert_eq!(product.id, "p1");
        assert_eq!(product.status, ProductStatus::Active);
        assert_eq!(product.category_id.as_deref(), Some("kitchen"));
        assert_eq!((product.created_at, product.updated_at), (5, 1_000));
    }

    #[test]
    fn test_invalid_records_are_rejected() {
        assert!(record(r#"{"title":" ","price":1}"#).into_product(0).is_err());
        assert!(record(r#"{"title":"a","price":-1}"#).into_product(0).is_err());
        assert!(record(r#"{"title":"a","price":1,"rating":7}"#).into_product(0).is_err());
        let err = record(r#"{"title":"a","price":1,"status":"activ"}"#).into_product(0).unwrap_err();
        assert!(err.contains("did you mean 'active'"));
    }
}
