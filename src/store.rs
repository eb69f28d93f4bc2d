//! DuckDB-backed record store for identification events, their search
//! results and price suggestions, plus locally saved demo listings.
//!
//! Monetary values live in `DECIMAL(10,2)` columns. They are bound as text
//! and cast in SQL, and read back as text, so no precision is lost through
//! floating point. DuckDB has no `ON DELETE CASCADE`; deleting an image
//! removes its dependents explicitly inside one transaction.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use duckdb::types::Type;
use duckdb::{params, Connection as DuckDbConnection, Row};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config;
use crate::error::Result;
use crate::models::{
    join_labels, split_labels, Listing, ListingCondition, ListingProduct, NewListingProduct,
    PriceSuggestion, ProductImage, SearchResult, StoredSuggestion,
};

const SCHEMA: &str = r#"
    CREATE SEQUENCE IF NOT EXISTS product_images_id_seq START 1;
    CREATE SEQUENCE IF NOT EXISTS search_results_id_seq START 1;
    CREATE SEQUENCE IF NOT EXISTS price_suggestions_id_seq START 1;
    CREATE SEQUENCE IF NOT EXISTS listing_products_id_seq START 1;

    CREATE TABLE IF NOT EXISTS product_images (
        id BIGINT PRIMARY KEY DEFAULT nextval('product_images_id_seq'),
        image_path VARCHAR,
        uploaded_at TIMESTAMP NOT NULL DEFAULT current_timestamp,
        detected_label VARCHAR NOT NULL DEFAULT '',
        detected_labels VARCHAR NOT NULL DEFAULT ''
    );

    CREATE TABLE IF NOT EXISTS search_results (
        id BIGINT PRIMARY KEY DEFAULT nextval('search_results_id_seq'),
        product_image_id BIGINT NOT NULL,
        title VARCHAR NOT NULL,
        description VARCHAR NOT NULL DEFAULT '',
        price DECIMAL(10,2) NOT NULL,
        currency VARCHAR NOT NULL DEFAULT 'USD',
        seller_name VARCHAR NOT NULL DEFAULT '',
        item_url VARCHAR NOT NULL DEFAULT '',
        image_url VARCHAR NOT NULL DEFAULT '',
        "condition" VARCHAR NOT NULL DEFAULT '',
        searched_at TIMESTAMP NOT NULL DEFAULT current_timestamp
    );

    CREATE TABLE IF NOT EXISTS price_suggestions (
        id BIGINT PRIMARY KEY DEFAULT nextval('price_suggestions_id_seq'),
        product_image_id BIGINT NOT NULL,
        min_price DECIMAL(10,2) NOT NULL,
        max_price DECIMAL(10,2) NOT NULL,
        average_price DECIMAL(10,2) NOT NULL,
        median_price DECIMAL(10,2) NOT NULL,
        suggested_price DECIMAL(10,2) NOT NULL,
        total_listings BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT current_timestamp
    );

    CREATE TABLE IF NOT EXISTS listing_products (
        id BIGINT PRIMARY KEY DEFAULT nextval('listing_products_id_seq'),
        title VARCHAR NOT NULL,
        price DECIMAL(10,2) NOT NULL,
        quantity BIGINT NOT NULL DEFAULT 1,
        "condition" VARCHAR NOT NULL,
        category_id VARCHAR NOT NULL,
        image_path VARCHAR,
        created_at TIMESTAMP NOT NULL DEFAULT current_timestamp
    );
"#;

const IMAGE_COLUMNS: &str = "id, image_path, CAST(uploaded_at AS VARCHAR), \
     detected_label, detected_labels";

const RESULT_COLUMNS: &str = "id, product_image_id, title, description, \
     CAST(price AS VARCHAR), currency, seller_name, item_url, image_url, \"condition\", \
     CAST(searched_at AS VARCHAR)";

const SUGGESTION_COLUMNS: &str = "id, product_image_id, CAST(min_price AS VARCHAR), \
     CAST(max_price AS VARCHAR), CAST(average_price AS VARCHAR), \
     CAST(median_price AS VARCHAR), CAST(suggested_price AS VARCHAR), total_listings, \
     CAST(created_at AS VARCHAR)";

const PRODUCT_COLUMNS: &str = "id, title, CAST(price AS VARCHAR), quantity, \"condition\", \
     category_id, image_path, CAST(created_at AS VARCHAR)";

/// Wraps a DuckDB connection holding all persisted records.
pub struct Store {
    conn: DuckDbConnection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open a store backed by a database file, creating it (and its parent
    /// directory) if needed. `None` opens an in-memory database.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let conn = match path {
            Some(p) => {
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                DuckDbConnection::open(p)?
            }
            None => DuckDbConnection::open_in_memory()?,
        };
        conn.execute_batch(SCHEMA)?;
        debug!(
            "Opened store at {}",
            path.map(|p| p.display().to_string())
                .unwrap_or_else(|| ":memory:".to_string())
        );
        Ok(Self {
            conn,
            path: path.map(Path::to_path_buf),
        })
    }

    /// Open an in-memory store.
    pub fn in_memory() -> Result<Self> {
        Self::open(None)
    }

    /// Database file location, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` inside a transaction, committing on `Ok` and rolling back on
    /// `Err`. Transactions do not nest.
    pub fn in_transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    warn!("Rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }

    // -- Product images ----------------------------------------------------

    /// Insert a new image record and return its id.
    pub fn create_image(&self, image_path: Option<&Path>, detected_label: &str) -> Result<i64> {
        let path = image_path.map(|p| p.to_string_lossy().to_string());
        let label = truncate(detected_label, config::MAX_LABEL_LEN);
        let id = self.conn.query_row(
            "INSERT INTO product_images (image_path, detected_label) VALUES (?, ?) RETURNING id",
            params![path, label],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Record the labels detected for an image.
    pub fn update_image_labels(&self, id: i64, detected_label: &str, labels: &[String]) -> Result<()> {
        self.conn.execute(
            "UPDATE product_images SET detected_label = ?, detected_labels = ? WHERE id = ?",
            params![truncate(detected_label, config::MAX_LABEL_LEN), join_labels(labels), id],
        )?;
        Ok(())
    }

    pub fn image(&self, id: i64) -> Result<Option<ProductImage>> {
        let sql = format!("SELECT {} FROM product_images WHERE id = ?", IMAGE_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![id], image_from_row)?;
        Ok(rows.collect::<duckdb::Result<Vec<_>>>()?.into_iter().next())
    }

    /// Newest images first.
    pub fn recent_images(&self, limit: usize) -> Result<Vec<ProductImage>> {
        let sql = format!(
            "SELECT {} FROM product_images ORDER BY uploaded_at DESC, id DESC LIMIT {}",
            IMAGE_COLUMNS, limit
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], image_from_row)?;
        Ok(rows.collect::<duckdb::Result<Vec<_>>>()?)
    }

    /// Delete an image together with its search results and suggestion.
    ///
    /// Returns `false` if no image had that id.
    pub fn delete_image(&self, id: i64) -> Result<bool> {
        self.in_transaction(|store| {
            store.clear_results(id)?;
            store.delete_suggestion(id)?;
            let deleted = store
                .conn
                .execute("DELETE FROM product_images WHERE id = ?", params![id])?;
            Ok(deleted > 0)
        })
    }

    // -- Search results ----------------------------------------------------

    pub fn insert_result(&self, product_image_id: i64, listing: &Listing) -> Result<i64> {
        let id = self.conn.query_row(
            "INSERT INTO search_results \
             (product_image_id, title, description, price, currency, seller_name, \
              item_url, image_url, \"condition\") \
             VALUES (?, ?, ?, CAST(? AS DECIMAL(10,2)), ?, ?, ?, ?, ?) RETURNING id",
            params![
                product_image_id,
                truncate(&listing.title, config::MAX_TITLE_LEN),
                listing.description,
                listing.price.to_string(),
                listing.currency,
                listing.seller,
                listing.item_url,
                listing.image_url,
                listing.condition,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Results for an image, cheapest first.
    pub fn results_for_image(&self, product_image_id: i64) -> Result<Vec<SearchResult>> {
        let sql = format!(
            "SELECT {} FROM search_results WHERE product_image_id = ? ORDER BY price ASC, id ASC",
            RESULT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![product_image_id], result_from_row)?;
        Ok(rows.collect::<duckdb::Result<Vec<_>>>()?)
    }

    /// Remove every search result of an image. Returns the number removed.
    pub fn clear_results(&self, product_image_id: i64) -> Result<usize> {
        let n = self.conn.execute(
            "DELETE FROM search_results WHERE product_image_id = ?",
            params![product_image_id],
        )?;
        Ok(n)
    }

    // -- Price suggestions -------------------------------------------------

    /// Store the suggestion for an image, replacing any previous one.
    pub fn insert_suggestion(&self, product_image_id: i64, suggestion: &PriceSuggestion) -> Result<i64> {
        self.delete_suggestion(product_image_id)?;
        let id = self.conn.query_row(
            "INSERT INTO price_suggestions \
             (product_image_id, min_price, max_price, average_price, median_price, \
              suggested_price, total_listings) \
             VALUES (?, CAST(? AS DECIMAL(10,2)), CAST(? AS DECIMAL(10,2)), \
                     CAST(? AS DECIMAL(10,2)), CAST(? AS DECIMAL(10,2)), \
                     CAST(? AS DECIMAL(10,2)), ?) RETURNING id",
            params![
                product_image_id,
                suggestion.min_price.to_string(),
                suggestion.max_price.to_string(),
                suggestion.average_price.to_string(),
                suggestion.median_price.to_string(),
                suggestion.suggested_price.to_string(),
                suggestion.total_listings as i64,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn suggestion_for_image(&self, product_image_id: i64) -> Result<Option<StoredSuggestion>> {
        let sql = format!(
            "SELECT {} FROM price_suggestions WHERE product_image_id = ? ORDER BY id DESC LIMIT 1",
            SUGGESTION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![product_image_id], suggestion_from_row)?;
        Ok(rows.collect::<duckdb::Result<Vec<_>>>()?.into_iter().next())
    }

    /// Returns `true` if a suggestion was removed.
    pub fn delete_suggestion(&self, product_image_id: i64) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM price_suggestions WHERE product_image_id = ?",
            params![product_image_id],
        )?;
        Ok(n > 0)
    }

    // -- Listing products --------------------------------------------------

    pub fn insert_product(&self, product: &NewListingProduct) -> Result<i64> {
        let image_path = product
            .image_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());
        let id = self.conn.query_row(
            "INSERT INTO listing_products \
             (title, price, quantity, \"condition\", category_id, image_path) \
             VALUES (?, CAST(? AS DECIMAL(10,2)), ?, ?, ?, ?) RETURNING id",
            params![
                product.title.trim(),
                product.price.to_string(),
                i64::from(product.quantity),
                product.condition.as_str(),
                product.category_id.trim(),
                image_path,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn product(&self, id: i64) -> Result<Option<ListingProduct>> {
        let sql = format!("SELECT {} FROM listing_products WHERE id = ?", PRODUCT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![id], product_from_row)?;
        Ok(rows.collect::<duckdb::Result<Vec<_>>>()?.into_iter().next())
    }

    /// All saved listings, newest first.
    pub fn products(&self) -> Result<Vec<ListingProduct>> {
        self.query_products(None)
    }

    pub fn recent_products(&self, limit: usize) -> Result<Vec<ListingProduct>> {
        self.query_products(Some(limit))
    }

    fn query_products(&self, limit: Option<usize>) -> Result<Vec<ListingProduct>> {
        let mut sql = format!(
            "SELECT {} FROM listing_products ORDER BY created_at DESC, id DESC",
            PRODUCT_COLUMNS
        );
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], product_from_row)?;
        Ok(rows.collect::<duckdb::Result<Vec<_>>>()?)
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn image_from_row(row: &Row<'_>) -> duckdb::Result<ProductImage> {
    let path: Option<String> = row.get(1)?;
    let labels: String = row.get(4)?;
    Ok(ProductImage {
        id: row.get(0)?,
        image_path: path.map(PathBuf::from),
        uploaded_at: row.get(2)?,
        detected_label: row.get(3)?,
        detected_labels: split_labels(&labels),
    })
}

fn result_from_row(row: &Row<'_>) -> duckdb::Result<SearchResult> {
    Ok(SearchResult {
        id: row.get(0)?,
        product_image_id: row.get(1)?,
        listing: Listing {
            title: row.get(2)?,
            description: row.get(3)?,
            price: decimal_at(row, 4)?,
            currency: row.get(5)?,
            seller: row.get(6)?,
            item_url: row.get(7)?,
            image_url: row.get(8)?,
            condition: row.get(9)?,
        },
        searched_at: row.get(10)?,
    })
}

fn suggestion_from_row(row: &Row<'_>) -> duckdb::Result<StoredSuggestion> {
    let total: i64 = row.get(7)?;
    Ok(StoredSuggestion {
        id: row.get(0)?,
        product_image_id: row.get(1)?,
        suggestion: PriceSuggestion {
            min_price: decimal_at(row, 2)?,
            max_price: decimal_at(row, 3)?,
            average_price: decimal_at(row, 4)?,
            median_price: decimal_at(row, 5)?,
            suggested_price: decimal_at(row, 6)?,
            total_listings: usize::try_from(total).unwrap_or(0),
        },
        created_at: row.get(8)?,
    })
}

fn product_from_row(row: &Row<'_>) -> duckdb::Result<ListingProduct> {
    let quantity: i64 = row.get(3)?;
    let condition: String = row.get(4)?;
    let condition = ListingCondition::from_str(&condition).map_err(|e| {
        duckdb::Error::FromSqlConversionFailure(4, Type::Text, e.to_string().into())
    })?;
    let path: Option<String> = row.get(6)?;
    Ok(ListingProduct {
        id: row.get(0)?,
        title: row.get(1)?,
        price: decimal_at(row, 2)?,
        quantity: u32::try_from(quantity).unwrap_or(0),
        condition,
        category_id: row.get(5)?,
        image_path: path.map(PathBuf::from),
        created_at: row.get(7)?,
    })
}

fn decimal_at(row: &Row<'_>, idx: usize) -> duckdb::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
