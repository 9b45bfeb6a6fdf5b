//! SQLite catalog store.
//!
//! The connection lives behind a `parking_lot::Mutex` so one store can be
//! shared by concurrent searches. Reads build their SQL from a
//! [`CatalogPageRequest`]; similarity is computed inside SQLite by the
//! `cosine_similarity` function registered on open.

use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::{Error, Result};
use crate::model::{CatalogEntry, Product, ProductStatus};
use crate::search::{SearchHit, SortField};
use crate::storage::catalog::{
    CatalogFilter, CatalogPageRequest, CatalogStats, CatalogStore, SimilarityClause,
};
use crate::storage::schema::{apply_schema, encode_embedding, register_functions};

const ENTRY_COLUMNS: &str = "id, title, type, images, price, sale_price, sale_duration, \
     stock, rating, short_description, long_description";

const PRODUCT_COLUMNS: &str = "id, title, type, images, price, sale_price, sale_duration, \
     stock, rating, short_description, long_description, status, category_id, subcategory_id, \
     created_at, updated_at";

/// What an upsert did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated {
        /// The embeddable text changed, so the stored embedding was dropped.
        embedding_cleared: bool,
    },
}

/// SQLite-backed catalog.
#[derive(Debug)]
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout (default 5 s).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(timeout_ms.map_or(Duration::from_secs(5), Duration::from_millis))?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        apply_schema(&conn)?;
        register_functions(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    // ==================
    // Writes
    // ==================

    /// Insert or update a product by id.
    ///
    /// `content_hash` fingerprints the product's embeddable text. When it
    /// differs from the stored one, the stale embedding is cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or a column constraint is violated.
    pub fn upsert_product(&self, product: &Product, content_hash: &str) -> Result<UpsertOutcome> {
        let images = serde_json::to_string(&product.images)?;
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let previous_hash: Option<Option<String>> = tx
            .query_row(
                "SELECT content_hash FROM products WHERE id = ?1",
                [&product.id],
                |row| row.get(0),
            )
            .optional()?;

        tx.execute(
            "INSERT INTO products (id, title, type, images, price, sale_price, sale_duration,
                 stock, rating, short_description, long_description, status, category_id,
                 subcategory_id, content_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 type = excluded.type,
                 images = excluded.images,
                 price = excluded.price,
                 sale_price = excluded.sale_price,
                 sale_duration = excluded.sale_duration,
                 stock = excluded.stock,
                 rating = excluded.rating,
                 short_description = excluded.short_description,
                 long_description = excluded.long_description,
                 status = excluded.status,
                 category_id = excluded.category_id,
                 subcategory_id = excluded.subcategory_id,
                 embedding = CASE WHEN products.content_hash IS excluded.content_hash
                                  THEN products.embedding ELSE NULL END,
                 embedding_model = CASE WHEN products.content_hash IS excluded.content_hash
                                  THEN products.embedding_model ELSE NULL END,
                 embedding_hash = CASE WHEN products.content_hash IS excluded.content_hash
                                  THEN products.embedding_hash ELSE NULL END,
                 content_hash = excluded.content_hash,
                 updated_at = excluded.updated_at",
            params![
                product.id,
                product.title,
                product.product_type,
                images,
                product.price,
                product.sale_price,
                product.sale_duration,
                product.stock,
                product.rating,
                product.short_description,
                product.long_description,
                product.status.as_str(),
                product.category_id,
                product.subcategory_id,
                content_hash,
                product.created_at,
                product.updated_at,
            ],
        )?;
        tx.commit()?;

        Ok(match previous_hash {
            None => UpsertOutcome::Inserted,
            Some(old) => UpsertOutcome::Updated {
                embedding_cleared: old.as_deref() != Some(content_hash),
            },
        })
    }

    /// Store a computed embedding for a product.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProductNotFound` if no product has this id.
    pub fn set_embedding(
        &self,
        id: &str,
        embedding: &[f32],
        model: &str,
        content_hash: &str,
    ) -> Result<()> {
        let blob = encode_embedding(embedding);
        let changed = self.conn.lock().execute(
            "UPDATE products SET embedding = ?2, embedding_model = ?3, embedding_hash = ?4
             WHERE id = ?1",
            params![id, blob, model, content_hash],
        )?;
        if changed == 0 {
            return Err(Error::ProductNotFound { id: id.to_string() });
        }
        Ok(())
    }

    // ==================
    // Reads
    // ==================

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_product(&self, id: &str) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let conn = self.conn.lock();
        let product = conn.query_row(&sql, [id], map_product).optional()?;
        Ok(product)
    }

    /// Products whose embedding is missing or stale, oldest first.
    ///
    /// With `force`, every product is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn products_needing_embeddings(&self, limit: Option<usize>, force: bool) -> Result<Vec<Product>> {
        let predicate = if force {
            "1 = 1"
        } else {
            "embedding IS NULL OR embedding_hash IS NOT content_hash"
        };
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE {predicate}
             ORDER BY created_at ASC, id ASC LIMIT ?1"
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([limit], map_product)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Error::from)
    }

    /// Dimension of the stored embeddings, if any exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn embedding_dimensions(&self) -> Result<Option<usize>> {
        let conn = self.conn.lock();
        let bytes: Option<i64> = conn
            .query_row(
                "SELECT length(embedding) FROM products WHERE embedding IS NOT NULL LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(bytes.and_then(|b| usize::try_from(b / 4).ok()))
    }

    /// Aggregate product counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn catalog_stats(&self) -> Result<CatalogStats> {
        let conn = self.conn.lock();
        let stats = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(status = 'active'), 0),
                    COALESCE(SUM(embedding IS NOT NULL AND embedding_hash IS content_hash), 0)
             FROM products",
            [],
            |row| {
                let total: i64 = row.get(0)?;
                let active: i64 = row.get(1)?;
                let embedded: i64 = row.get(2)?;
                Ok((total, active, embedded))
            },
        )?;

        let to_u64 = |n: i64| u64::try_from(n).unwrap_or(0);
        Ok(CatalogStats {
            total: to_u64(stats.0),
            active: to_u64(stats.1),
            embedded: to_u64(stats.2),
            pending: to_u64(stats.0 - stats.2),
        })
    }

    fn query_page(&self, request: &CatalogPageRequest) -> Result<Vec<SearchHit>> {
        let mut sql = SqlBuilder::default();
        let similarity_expr = request
            .similarity
            .as_ref()
            .map(|clause| format!("cosine_similarity(embedding, {})", sql.bind(encode_embedding(&clause.query_embedding))));

        let projection = match &similarity_expr {
            Some(expr) => format!("{ENTRY_COLUMNS}, {expr} AS similarity"),
            None => format!("{ENTRY_COLUMNS}, NULL AS similarity"),
        };
        let where_clause = sql.where_clause(&request.filter, similarity_expr.as_deref(), request.similarity.as_ref());

        let order_column = match (request.sort.field, &similarity_expr) {
            (SortField::Similarity, None) => {
                return Err(Error::InvalidArgument(
                    "similarity sort requires a query embedding".into(),
                ));
            }
            (field, _) => field.column(),
        };

        let limit = sql.bind(i64::from(request.limit));
        let offset = sql.bind(i64::try_from(request.offset).unwrap_or(i64::MAX));
        let query = format!(
            "SELECT {projection} FROM products {where_clause}
             ORDER BY {order_column} {}, id ASC
             LIMIT {limit} OFFSET {offset}",
            request.sort.direction.as_sql(),
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(params_from_iter(sql.values.iter()), |row| {
            Ok(SearchHit {
                entry: map_entry(row)?,
                similarity: row.get(11)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Error::from)
    }

    fn query_count(&self, filter: &CatalogFilter, similarity: Option<&SimilarityClause>) -> Result<u64> {
        let mut sql = SqlBuilder::default();
        let similarity_expr = similarity.map(|clause| {
            format!("cosine_similarity(embedding, {})", sql.bind(encode_embedding(&clause.query_embedding)))
        });
        let where_clause = sql.where_clause(filter, similarity_expr.as_deref(), similarity);
        let query = format!("SELECT COUNT(*) FROM products {where_clause}");

        let conn = self.conn.lock();
        let count: i64 = conn.query_row(&query, params_from_iter(sql.values.iter()), |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

impl CatalogStore for SqliteCatalog {
    // SQLite calls are local and short; they run inline on the calling task.
    async fn fetch_page(&self, request: &CatalogPageRequest) -> Result<Vec<SearchHit>> {
        self.query_page(request)
    }

    async fn count(&self, filter: &CatalogFilter, similarity: Option<&SimilarityClause>) -> Result<u64> {
        self.query_count(filter, similarity)
    }
}

/// Accumulates bound values and hands out numbered placeholders.
#[derive(Default)]
struct SqlBuilder {
    values: Vec<Value>,
}

impl SqlBuilder {
    fn bind(&mut self, value: impl Into<Value>) -> String {
        self.values.push(value.into());
        format!("?{}", self.values.len())
    }

    fn where_clause(
        &mut self,
        filter: &CatalogFilter,
        similarity_expr: Option<&str>,
        similarity: Option<&SimilarityClause>,
    ) -> String {
        let mut conditions = vec![format!("status = '{}'", ProductStatus::Active.as_str())];

        if let Some(category) = &filter.category_id {
            conditions.push(format!("category_id = {}", self.bind(category.clone())));
        }
        if let Some(subcategory) = &filter.subcategory_id {
            conditions.push(format!("subcategory_id = {}", self.bind(subcategory.clone())));
        }
        if let Some(min) = filter.min_price {
            conditions.push(format!("price >= {}", self.bind(min)));
        }
        if let Some(max) = filter.max_price {
            conditions.push(format!("price <= {}", self.bind(max)));
        }
        if let Some(rating) = filter.min_rating {
            conditions.push(format!("rating >= {}", self.bind(rating)));
        }
        if let (Some(expr), Some(clause)) = (similarity_expr, similarity) {
            conditions.push(format!("{expr} > {}", self.bind(clause.threshold)));
        }

        format!("WHERE {}", conditions.join(" AND "))
    }
}

fn parse_images(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_entry(row: &Row<'_>) -> rusqlite::Result<CatalogEntry> {
    Ok(CatalogEntry {
        id: row.get(0)?,
        title: row.get(1)?,
        product_type: row.get(2)?,
        images: parse_images(row, 3)?,
        price: row.get(4)?,
        sale_price: row.get(5)?,
        sale_duration: row.get(6)?,
        stock: row.get(7)?,
        rating: row.get(8)?,
        short_description: row.get(9)?,
        long_description: row.get(10)?,
    })
}

fn map_product(row: &Row<'_>) -> rusqlite::Result<Product> {
    let status: String = row.get(11)?;
    Ok(Product {
        id: row.get(0)?,
        title: row.get(1)?,
        product_type: row.get(2)?,
        images: parse_images(row, 3)?,
        price: row.get(4)?,
        sale_price: row.get(5)?,
        sale_duration: row.get(6)?,
        stock: row.get(7)?,
        rating: row.get(8)?,
        short_description: row.get(9)?,
        long_description: row.get(10)?,
        status: ProductStatus::from_stored(&status),
        category_id: row.get(12)?,
        subcategory_id: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{SortDirection, SortSpec};

    fn product(id: &str, price: f64, rating: f64) -> Product {
        let mut p = Product::new(format!("Product {id}"), price);
        p.id = id.to_string();
        p.rating = rating;
        p.status = ProductStatus::Active;
        p
    }

    fn insert(store: &SqliteCatalog, p: &Product) {
        store.upsert_product(p, &format!("hash-{}", p.title)).unwrap();
    }

    fn request(filter: CatalogFilter, sort: SortSpec) -> CatalogPageRequest {
        CatalogPageRequest { filter, similarity: None, sort, limit: 10, offset: 0 }
    }

    fn ids(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|h| h.entry.id.as_str()).collect()
    }

    #[test]
    fn test_upsert_reports_insert_then_update() {
        let store = SqliteCatalog::open_memory().unwrap();
        let p = product("a", 10.0, 4.0);

        assert_eq!(store.upsert_product(&p, "h1").unwrap(), UpsertOutcome::Inserted);
        assert_eq!(
            store.upsert_product(&p, "h1").unwrap(),
            UpsertOutcome::Updated { embedding_cleared: false }
        );
        assert_eq!(store.get_product("a").unwrap().unwrap().title, "Product a");
        assert!(store.get_product("missing").unwrap().is_none());
    }

    #[test]
    fn test_text_change_clears_embedding() {
        let store = SqliteCatalog::open_memory().unwrap();
        let p = product("a", 10.0, 4.0);
        store.upsert_product(&p, "h1").unwrap();
        store.set_embedding("a", &[1.0, 0.0], "test", "h1").unwrap();
        assert!(store.products_needing_embeddings(None, false).unwrap().is_empty());

        let outcome = store.upsert_product(&p, "h2").unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated { embedding_cleared: true });
        assert_eq!(store.products_needing_embeddings(None, false).unwrap().len(), 1);
        assert_eq!(store.catalog_stats().unwrap().embedded, 0);
    }

    #[test]
    fn test_set_embedding_unknown_product() {
        let store = SqliteCatalog::open_memory().unwrap();
        let err = store.set_embedding("nope", &[1.0], "m", "h").unwrap_err();
        assert!(matches!(err, Error::ProductNotFound { .. }));
    }

    #[tokio::test]
    async fn test_inactive_products_are_never_returned() {
        let store = SqliteCatalog::open_memory().unwrap();
        insert(&store, &product("a", 10.0, 4.0));
        let mut draft = product("b", 10.0, 5.0);
        draft.status = ProductStatus::Draft;
        insert(&store, &draft);

        let hits = store
            .fetch_page(&request(CatalogFilter::default(), SortSpec::BROWSE_DEFAULT))
            .await
            .unwrap();
        assert_eq!(ids(&hits), vec!["a"]);
        assert_eq!(store.count(&CatalogFilter::default(), None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_filters_are_conjunctive() {
        let store = SqliteCatalog::open_memory().unwrap();
        let mut a = product("a", 50.0, 4.0);
        a.category_id = Some("shoes".into());
        let mut b = product("b", 150.0, 4.5);
        b.category_id = Some("shoes".into());
        let mut c = product("c", 150.0, 4.5);
        c.category_id = Some("hats".into());
        for p in [&a, &b, &c] {
            insert(&store, p);
        }

        let filter = CatalogFilter {
            category_id: Some("shoes".into()),
            min_price: Some(100.0),
            min_rating: Some(4.5),
            ..CatalogFilter::default()
        };
        let hits = store.fetch_page(&request(filter.clone(), SortSpec::BROWSE_DEFAULT)).await.unwrap();
        assert_eq!(ids(&hits), vec!["b"]);
        assert_eq!(store.count(&filter, None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_equal_keys_tie_break_on_id() {
        let store = SqliteCatalog::open_memory().unwrap();
        for id in ["c", "a", "b"] {
            insert(&store, &product(id, 10.0, 4.0));
        }

        let hits = store
            .fetch_page(&request(CatalogFilter::default(), SortSpec::BROWSE_DEFAULT))
            .await
            .unwrap();
        assert_eq!(ids(&hits), vec!["a", "b", "c"]);

        let asc = SortSpec { field: SortField::Price, direction: SortDirection::Asc };
        let page = CatalogPageRequest { limit: 2, offset: 2, ..request(CatalogFilter::default(), asc) };
        assert_eq!(ids(&store.fetch_page(&page).await.unwrap()), vec!["c"]);
    }

    #[tokio::test]
    async fn test_similarity_projection_and_predicate() {
        let store = SqliteCatalog::open_memory().unwrap();
        for (id, embedding) in [("near", [1.0, 0.1]), ("far", [0.0, 1.0])] {
            insert(&store, &product(id, 10.0, 3.0));
            store.set_embedding(id, &embedding, "test", &format!("hash-Product {id}")).unwrap();
        }
        insert(&store, &product("none", 10.0, 3.0));

        let clause = SimilarityClause { query_embedding: vec![1.0, 0.0], threshold: 0.5 };
        let request = CatalogPageRequest {
            similarity: Some(clause.clone()),
            ..request(CatalogFilter::default(), SortSpec::SEMANTIC_DEFAULT)
        };
        let hits = store.fetch_page(&request).await.unwrap();

        assert_eq!(ids(&hits), vec!["near"]);
        assert!(hits[0].similarity.unwrap() > 0.99);
        assert_eq!(store.count(&CatalogFilter::default(), Some(&clause)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_similarity_sort_without_embedding_is_rejected() {
        let store = SqliteCatalog::open_memory().unwrap();
        let result = store
            .fetch_page(&request(CatalogFilter::default(), SortSpec::SEMANTIC_DEFAULT))
            .await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_catalog_stats() {
        let store = SqliteCatalog::open_memory().unwrap();
        insert(&store, &product("a", 1.0, 1.0));
        let mut draft = product("b", 1.0, 1.0);
        draft.status = ProductStatus::Draft;
        insert(&store, &draft);
        store.set_embedding("a", &[0.5, 0.5, 0.5], "m", "hash-Product a").unwrap();

        let stats = store.catalog_stats().unwrap();
        assert_eq!(stats, CatalogStats { total: 2, active: 1, embedded: 1, pending: 1 });
        assert_eq!(store.embedding_dimensions().unwrap(), Some(3));
    }
}
