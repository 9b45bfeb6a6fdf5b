//! Catalog schema and SQL functions.

use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Result};

use crate::search::similarity::cosine_similarity;

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the catalog database.
///
/// Timestamps are INTEGER Unix milliseconds. `embedding` holds little-endian
/// f32 values and stays NULL until the backfill computes it.
/// `embedding_hash` is the `content_hash` the stored embedding was computed
/// from; a mismatch marks the embedding stale.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'physical',
    images TEXT NOT NULL DEFAULT '[]',
    price REAL NOT NULL CHECK (price >= 0),
    sale_price REAL,
    sale_duration INTEGER,
    stock INTEGER NOT NULL DEFAULT 0,
    rating REAL NOT NULL DEFAULT 0 CHECK (rating >= 0 AND rating <= 5),
    short_description TEXT,
    long_description TEXT,
    status TEXT NOT NULL DEFAULT 'draft' CHECK (status IN ('active', 'draft', 'archived')),
    category_id TEXT,
    subcategory_id TEXT,
    content_hash TEXT,
    embedding BLOB,
    embedding_model TEXT,
    embedding_hash TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_products_status ON products(status);
CREATE INDEX IF NOT EXISTS idx_products_category ON products(status, category_id);
CREATE INDEX IF NOT EXISTS idx_products_subcategory ON products(status, subcategory_id);
CREATE INDEX IF NOT EXISTS idx_products_price ON products(price);
CREATE INDEX IF NOT EXISTS idx_products_rating ON products(rating);
";

/// Apply pragmas, create tables, and record the schema version.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}

/// Register `cosine_similarity(embedding_blob, query_blob)`.
///
/// Yields NULL when either side is NULL, not a whole number of f32 values,
/// zero-magnitude, or of a different dimension.
///
/// # Errors
///
/// Returns an error if SQLite rejects the registration.
pub fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "cosine_similarity",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let (ValueRef::Blob(a), ValueRef::Blob(b)) = (ctx.get_raw(0), ctx.get_raw(1)) else {
                return Ok(None);
            };
            let (Some(a), Some(b)) = (decode_embedding(a), decode_embedding(b)) else {
                return Ok(None);
            };
            Ok(cosine_similarity(&a, &b))
        },
    )?;
    Ok(())
}

/// Serialize an embedding as little-endian f32 bytes.
#[must_use]
pub fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Parse a little-endian f32 blob. `None` if the length is not a multiple of 4.
#[must_use]
pub fn decode_embedding(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            .collect(),
    )
}
