//! Catalog command implementation.
//!
//! - `import` - upsert products from JSONL
//! - `embed` - compute missing or stale product embeddings
//! - `stats` - product and embedding counts

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::CatalogCommands;
use crate::embeddings::{create_embedding_provider, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::storage::SqliteCatalog;
use crate::sync::{product_hash, CatalogImporter};

use super::{open_catalog, runtime};

/// Products sent to the provider per request.
const EMBED_BATCH_SIZE: usize = 16;

#[derive(Serialize)]
struct EmbedOutput {
    processed: usize,
    errors: usize,
    remaining: u64,
    provider: String,
    model: String,
}

/// Execute a catalog subcommand.
///
/// # Errors
///
/// Returns an error if the database is missing or the subcommand fails.
pub fn execute(command: &CatalogCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let store = open_catalog(db_path)?;
    match command {
        CatalogCommands::Import { file } => execute_import(&store, file, json),
        CatalogCommands::Embed { limit, force } => {
            runtime()?.block_on(execute_embed(&store, *limit, *force, json))
        }
        CatalogCommands::Stats => execute_stats(&store, json),
    }
}

fn execute_import(store: &SqliteCatalog, file: &Path, json: bool) -> Result<()> {
    let stats = CatalogImporter::new(store).import(file)?;

    if json {
        println!("{}", serde_json::to_string(&stats)?);
    } else {
        println!("Imported {} products from {}", stats.total(), file.display());
        println!("  Created: {}", stats.created);
        println!("  Updated: {}", stats.updated);
        if stats.embeddings_invalidated > 0 {
            println!("  Stale embeddings cleared: {}", stats.embeddings_invalidated);
            println!();
            println!("Run 'sfs catalog embed' to refresh them.");
        }
    }
    Ok(())
}

/// Embed products whose text has no current embedding.
///
/// Every stored embedding must share one dimension. A provider whose vectors
/// differ from what is already stored is rejected unless the run re-embeds
/// the whole catalog (`--force` without `--limit`).
async fn execute_embed(store: &SqliteCatalog, limit: Option<usize>, force: bool, json: bool) -> Result<()> {
    let provider = create_embedding_provider().await.ok_or_else(|| {
        Error::Embedding("No embedding provider available. Start Ollama or set HF_TOKEN.".into())
    })?;
    let info = provider.info();

    let products = store.products_needing_embeddings(limit, force)?;
    let mut expected_dims = required_dimensions(store.embedding_dimensions()?, force, limit);
    let mut processed = 0;
    let mut errors = 0;

    for batch in products.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|p| p.embedding_text(info.max_chars)).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();

        let vectors = match provider.embed_batch(&refs).await {
            Ok(vectors) => vectors,
            Err(err) => {
                tracing::warn!(error = %err, batch = batch.len(), "embedding batch failed");
                errors += batch.len();
                continue;
            }
        };

        for (product, vector) in batch.iter().zip(vectors) {
            if vector.is_empty() {
                tracing::warn!(id = %product.id, "provider returned an empty embedding");
                errors += 1;
                continue;
            }
            match expected_dims {
                Some(expected) if expected != vector.len() => {
                    return Err(Error::DimensionMismatch { expected, actual: vector.len() });
                }
                Some(_) => {}
                None => expected_dims = Some(vector.len()),
            }

            store.set_embedding(&product.id, &vector, &info.model, &product_hash(product))?;
            processed += 1;
        }
        tracing::debug!(processed, errors, "embedding batch stored");
    }

    let output = EmbedOutput {
        processed,
        errors,
        remaining: store.catalog_stats()?.pending,
        provider: info.name,
        model: info.model,
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Embedded {} products with {} ({})", output.processed, output.provider, output.model);
        if output.errors > 0 {
            println!("  Errors: {}", output.errors);
        }
        println!("  Remaining: {}", output.remaining);
    }
    Ok(())
}

/// Dimension new embeddings must have, if constrained.
///
/// Only a forced run over every product may switch dimension; a limited
/// forced run would leave old and new dimensions side by side.
fn required_dimensions(stored: Option<usize>, force: bool, limit: Option<usize>) -> Option<usize> {
    if force && limit.is_none() { None } else { stored }
}

fn execute_stats(store: &SqliteCatalog, json: bool) -> Result<()> {
    let stats = store.catalog_stats()?;

    if json {
        println!("{}", serde_json::to_string(&stats)?);
    } else {
        println!("Catalog");
        println!("  Products:          {}", stats.total);
        println!("  Active:            {}", stats.active);
        println!("  Embedded:          {}", stats.embedded);
        println!("  Pending embedding: {}", stats.pending);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_dimensions() {
        assert_eq!(required_dimensions(Some(768), false, None), Some(768));
        assert_eq!(required_dimensions(Some(768), false, Some(10)), Some(768));
        assert_eq!(required_dimensions(Some(768), true, Some(10)), Some(768));
        assert_eq!(required_dimensions(Some(768), true, None), None);
        assert_eq!(required_dimensions(None, false, Some(10)), None);
    }
}
