//! Content hashing for change detection.
//!
//! Products are fingerprinted by the text their embedding is computed from.
//! A stored embedding whose hash no longer matches is stale.

use sha2::{Digest, Sha256};

use crate::model::Product;

/// SHA-256 of `text` as 64 lowercase hex characters.
#[must_use]
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hash of a product's full, untruncated embeddable text.
#[must_use]
pub fn product_hash(product: &Product) -> String {
    content_hash(&product.embedding_text(usize::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_deterministic() {
        let hash = content_hash("Trail Runner");
        assert_eq!(hash, content_hash("Trail Runner"));
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, content_hash("Trail Runner 2"));
    }

    #[test]
    fn test_product_hash_ignores_non_text_fields() {
        let mut product = Product::new("Mug", 9.0);
        let before = product_hash(&product);
        product.price = 12.0;
        product.rating = 4.0;
        assert_eq!(product_hash(&product), before);

        product.short_description = Some("Stoneware".into());
        assert_ne!(product_hash(&product), before);
    }
}
