//! Search command implementation.

use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;

use crate::cli::SearchArgs;
use crate::config::resolve_search_settings;
use crate::embeddings::{create_embedding_provider, EmbeddingProvider};
use crate::error::Result;
use crate::search::{SearchHit, SearchMode, SearchQuery, SearchResultPage, SearchService};
use crate::storage::SqliteCatalog;
use crate::validate::{suggest_sort, validate_search_query};

use super::{open_catalog, runtime};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchOutput<'a> {
    mode: SearchMode,
    page: u32,
    #[serde(flatten)]
    results: &'a SearchResultPage,
}

impl From<&SearchArgs> for SearchQuery {
    fn from(args: &SearchArgs) -> Self {
        Self {
            query: args.query.clone(),
            category_id: args.category.clone(),
            subcategory_id: args.subcategory.clone(),
            min_price: args.min_price,
            max_price: args.max_price,
            rating: args.rating,
            sort: args.sort.clone(),
            page: args.page,
        }
    }
}

/// Execute the search command.
///
/// Backend failures during the search itself produce an empty page, not an
/// error; see the logs (`-v`) for the cause.
///
/// # Errors
///
/// Returns an error for invalid arguments, a missing database, or bad
/// search settings.
pub fn execute(args: &SearchArgs, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let query = SearchQuery::from(args);
    validate_search_query(&query)?;

    if let Some(raw) = query.sort.as_deref() {
        if let Some(suggestion) = suggest_sort(raw) {
            tracing::warn!(sort = raw, suggestion = %suggestion, "unrecognized sort, using default");
        }
    }

    let store = open_catalog(db_path)?;
    let settings = resolve_search_settings()?;
    let mode = SearchMode::for_query(&query);

    let rt = runtime()?;
    let results = rt.block_on(async {
        let provider = match mode {
            SearchMode::Semantic => create_embedding_provider().await,
            SearchMode::Browse => None,
        };

        if let Some(provider) = &provider {
            let info = provider.info();
            if let Some(stored) = stored_dimension_mismatch(&store, info.dimensions) {
                tracing::warn!(
                    stored,
                    provider = info.dimensions,
                    model = %info.model,
                    "catalog embeddings do not match the query model; run `sfs catalog embed --force`"
                );
            }
        }

        if mode == SearchMode::Semantic && provider.is_none() && !json {
            eprintln!(
                "{} no embedding provider available; start Ollama or set HF_TOKEN",
                "warning:".yellow().bold()
            );
        }

        let service = match provider {
            Some(provider) => SearchService::with_provider(store, provider, settings),
            None => SearchService::browse_only(store, settings),
        };
        service.search(&query).await
    });

    if json {
        let output = SearchOutput {
            mode,
            page: query.page,
            results: &results,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_table(&results, mode, query.page);
    }

    Ok(())
}

/// The stored embedding dimension, when it differs from `provider_dims`.
///
/// Rows of another dimension get NULL similarity, so a mismatch makes every
/// semantic search come back empty.
fn stored_dimension_mismatch(store: &SqliteCatalog, provider_dims: usize) -> Option<usize> {
    match store.embedding_dimensions() {
        Ok(Some(stored)) if stored != provider_dims => Some(stored),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(error = %err, "could not read stored embedding dimension");
            None
        }
    }
}

fn print_table(results: &SearchResultPage, mode: SearchMode, page: u32) {
    if results.is_empty() {
        println!("No products found.");
        if results.page_count > 0 && u64::from(page) > results.page_count {
            println!("(page {page} is past the last page, {})", results.page_count);
        }
        return;
    }

    println!(
        "{} {} (page {} of {}, {} mode)",
        results.total.to_string().bold(),
        if results.total == 1 { "product" } else { "products" },
        page,
        results.page_count.max(1),
        mode
    );
    println!();

    for hit in &results.data {
        print_hit(hit);
    }
}

fn print_hit(hit: &SearchHit) {
    let entry = &hit.entry;
    let price = match entry.sale_price {
        Some(sale) => format!("{} {}", format!("{sale:.2}").green(), format!("{:.2}", entry.price).strikethrough()),
        None => format!("{:.2}", entry.price),
    };

    print!(
        "  {}  {}  {}  {}",
        entry.id.dimmed(),
        entry.title.bold(),
        price,
        format!("★ {:.1}", entry.rating).yellow()
    );
    if let Some(similarity) = hit.similarity {
        print!("  {}", format!("sim {similarity:.3}").cyan());
    }
    if entry.stock <= 0 {
        print!("  {}", "out of stock".red());
    }
    println!();
}
