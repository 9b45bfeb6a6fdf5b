//! Product model for the storefront catalog.
//!
//! Products are owned by the catalog store. Search only ever reads the
//! [`CatalogEntry`] projection and never mutates a product.

use serde::{Deserialize, Serialize};

/// Product lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// Visible on the storefront and eligible for search.
    Active,
    #[default]
    Draft,
    Archived,
}

impl ProductStatus {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Draft => "draft",
            Self::Archived => "archived",
        }
    }

    /// Parse from a stored string. Unknown values fall back to `Draft`.
    #[must_use]
    pub fn from_stored(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "active" => Self::Active,
            "archived" => Self::Archived,
            _ => Self::Draft,
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only catalog projection consumed by search.
///
/// Serialized with camelCase keys so API consumers see `salePrice`,
/// `shortDescription` and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub images: Vec<String>,
    pub price: f64,
    pub sale_price: Option<f64>,
    /// End of the sale window (Unix milliseconds).
    pub sale_duration: Option<i64>,
    pub stock: i64,
    pub rating: f64,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
}

/// A product as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    #[serde(rename = "type", default = "default_product_type")]
    pub product_type: String,
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
    pub status: ProductStatus,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub subcategory_id: Option<String>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

fn default_product_type() -> String {
    "physical".to_string()
}

impl Product {
    /// Create a new draft product with default values.
    pub fn new(title: impl Into<String>, price: f64) -> Self {
        let now = chrono::Utc::now().timestamp_millis();

        Self {
            id: format!("prod_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]),
            title: title.into(),
            product_type: default_product_type(),
            images: Vec::new(),
            price,
            sale_price: None,
            sale_duration: None,
            stock: 0,
            rating: 0.0,
            short_description: None,
            long_description: None,
            status: ProductStatus::Draft,
            category_id: None,
            subcategory_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Text fed to the embedding provider for this product.
    ///
    /// Title, short description and long description joined by newlines,
    /// truncated to `max_chars` characters.
    #[must_use]
    pub fn embedding_text(&self, max_chars: usize) -> String {
        let mut parts = vec![self.title.trim()];
        for text in [&self.short_description, &self.long_description].into_iter().flatten() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }

        let joined = parts.join("\n");
        if joined.chars().count() <= max_chars {
            joined
        } else {
            joined.chars().take(max_chars).collect()
        }
    }

    /// Project this product into the shape search returns.
    #[must_use]
    pub fn to_entry(&self) -> CatalogEntry {
        CatalogEntry {
            id: self.id.clone(),
            title: self.title.clone(),
            product_type: self.product_type.clone(),
            images: self.images.clone(),
            price: self.price,
            sale_price: self.sale_price,
            sale_duration: self.sale_duration,
            stock: self.stock,
            rating: self.rating,
            short_description: self.short_description.clone(),
            long_description: self.long_description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_is_draft() {
        let product = Product::new("Red Shoes", 49.5);
        assert!(product.id.starts_with("prod_"));
        assert_eq!(product.status, ProductStatus::Draft);
        assert_eq!(product.created_at, product.updated_at);
    }

    #[test]
    fn test_status_round_trips_through_storage_string() {
        for status in [ProductStatus::Active, ProductStatus::Draft, ProductStatus::Archived] {
            assert_eq!(ProductStatus::from_stored(status.as_str()), status);
        }
        assert_eq!(ProductStatus::from_stored("unknown"), ProductStatus::Draft);
    }

    #[test]
    fn test_embedding_text_skips_empty_and_truncates() {
        let mut product = Product::new("Trail Runner", 120.0);
        product.short_description = Some("  ".to_string());
        product.long_description = Some("Grippy outsole".to_string());

        assert_eq!(product.embedding_text(1000), "Trail Runner\nGrippy outsole");
        assert_eq!(product.embedding_text(5), "Trail");
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let mut product = Product::new("Mug", 9.0);
        product.sale_price = Some(7.0);
        let json = serde_json::to_value(product.to_entry()).unwrap();
        assert_eq!(json["type"], "physical");
        assert_eq!(json["salePrice"], 7.0);
        assert!(json.get("shortDescription").is_some());
    }
}
