//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD; writes take the database write gate
//! - Paginated substring search over name and barcode
//! - Stock adjustments (row helpers used by the unit of work)
//!
//! ## Search
//! ```text
//! term "COLA", page 2, page size 20
//!     │
//!     ▼
//! name LIKE '%cola%' OR barcode LIKE '%cola%'   (ASCII case-insensitive, % and _ escaped)
//! ORDER BY id DESC  LIMIT 20 OFFSET 20
//! ```

use sqlx::{Executor, Sqlite, SqlitePool};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use tally_core::validation::{validate_new_product, validate_page, validate_product, validate_search_query};
use tally_core::{CoreError, NewProduct, Product, ProductId, ProductPage};

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = "id, name, price_cents, stock, detail, barcode";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let id = repo.add(&new_product).await?;
/// let page = repo.search("cola", 1, 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, write_gate: Arc<Mutex<()>>) -> Self {
        ProductRepository { pool, write_gate }
    }

    /// Inserts a new product and returns its id.
    ///
    /// ## Returns
    /// * `Err(CoreError::DuplicateBarcode)` - barcode already used by another product
    /// * `Err(CoreError::Validation)` - empty name, negative price, barcode too long
    pub async fn add(&self, product: &NewProduct) -> DbResult<ProductId> {
        validate_new_product(product).map_err(CoreError::from)?;

        let name = product.name.trim();
        let barcode = product.barcode.trim();

        debug!(name = %name, barcode = %barcode, "Inserting product");

        let _gate = self.write_gate.lock().await;

        let result = sqlx::query(
            r#"
            INSERT INTO products (name, price_cents, stock, detail, barcode)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.detail)
        .bind(barcode)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_barcode(e.into(), barcode))?;

        Ok(result.last_insert_rowid())
    }

    /// Overwrites every field of an existing product.
    ///
    /// ## Returns
    /// * `Ok(1)` - updated
    /// * `Ok(0)` - no product with that id
    pub async fn update(&self, product: &Product) -> DbResult<u64> {
        validate_product(product).map_err(CoreError::from)?;

        let barcode = product.barcode.trim();

        debug!(id = product.id, "Updating product");

        let _gate = self.write_gate.lock().await;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                price_cents = ?3,
                stock = ?4,
                detail = ?5,
                barcode = ?6
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(product.name.trim())
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.detail)
        .bind(barcode)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_barcode(e.into(), barcode))?;

        Ok(result.rows_affected())
    }

    /// Deletes a product.
    ///
    /// Past sales keep their frozen name and price; voiding one of them
    /// later skips this product's stock restoration.
    pub async fn delete(&self, id: ProductId) -> DbResult<u64> {
        debug!(id, "Deleting product");

        let _gate = self.write_gate.lock().await;

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Every product, newest first.
    pub async fn get_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// One page of products whose name or barcode contains `term`.
    ///
    /// Pages are 1-based; an empty term matches every product. The page and
    /// `total` come from the same read transaction. Case folding is SQLite
    /// `LIKE` folding, which covers ASCII letters only: `crème` finds
    /// "Café Crème" but `CRÈME` does not.
    pub async fn search(&self, term: &str, page: u32, page_size: u32) -> DbResult<ProductPage> {
        validate_page(page, page_size).map_err(CoreError::from)?;
        let term = validate_search_query(term).map_err(CoreError::from)?;

        let pattern = like_pattern(&term);
        let offset = i64::from(page - 1) * i64::from(page_size);

        debug!(term = %term, page, page_size, "Searching products");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE name LIKE ?1 ESCAPE '\' OR barcode LIKE ?1 ESCAPE '\'
            ORDER BY id DESC
            LIMIT ?2 OFFSET ?3
            "#
        ))
        .bind(&pattern)
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&mut *tx)
        .await?;

        let total = count_matching(&mut *tx, &pattern).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(count = products.len(), total, "Search returned products");

        Ok(ProductPage {
            products,
            total,
            page,
            page_size,
        })
    }

    /// Number of products whose name or barcode contains `term`.
    pub async fn count(&self, term: &str) -> DbResult<i64> {
        let term = validate_search_query(term).map_err(CoreError::from)?;
        count_matching(&self.pool, &like_pattern(&term)).await
    }

    /// Gets a product by its id.
    pub async fn get_by_id(&self, id: ProductId) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Exact barcode lookup, as a scanner would do it.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let barcode = barcode.trim();
        if barcode.is_empty() {
            return Ok(None);
        }

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1"
        ))
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }
}

// =============================================================================
// Row Helpers
// =============================================================================

/// `stock = stock + delta`. Returns rows affected.
pub(crate) async fn adjust_stock_row<'e, E>(executor: E, id: ProductId, delta: i64) -> DbResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id, delta, "Adjusting stock");

    let result = sqlx::query("UPDATE products SET stock = stock + ?2 WHERE id = ?1")
        .bind(id)
        .bind(delta)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// `stock = stock - quantity` only when enough is on hand. Returns rows affected.
pub(crate) async fn take_stock_row<'e, E>(executor: E, id: ProductId, quantity: i64) -> DbResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id, quantity, "Taking stock");

    let result = sqlx::query("UPDATE products SET stock = stock - ?2 WHERE id = ?1 AND stock >= ?2")
        .bind(id)
        .bind(quantity)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn stock_level<'e, E>(executor: E, id: ProductId) -> DbResult<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let stock = sqlx::query_scalar::<_, i64>("SELECT stock FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(stock)
}

async fn count_matching<'e, E>(executor: E, pattern: &str) -> DbResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM products
        WHERE name LIKE ?1 ESCAPE '\' OR barcode LIKE ?1 ESCAPE '\'
        "#,
    )
    .bind(pattern)
    .fetch_one(executor)
    .await?;

    Ok(total)
}

/// Wraps a search term for `LIKE ... ESCAPE '\'`.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn duplicate_barcode(err: DbError, barcode: &str) -> DbError {
    match err {
        DbError::UniqueViolation { .. } => CoreError::DuplicateBarcode(barcode.to_string()).into(),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
