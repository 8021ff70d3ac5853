//! Importing a database written by the earlier till application.

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use std::path::{Path, PathBuf};
use tally_core::{CartItem, CoreError, Discount, ErrorKind, SaleStatus};
use tally_db::{Database, DbConfig, DbError, ImportSummary};
use tempfile::TempDir;

const LEGACY_PRODUCTS: &str = r#"
    CREATE TABLE products (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      price INTEGER NOT NULL,
      stock INTEGER DEFAULT 1,
      detail TEXT,
      barcode TEXT UNIQUE
    )
"#;

/// Writes a legacy file; `with_status` adds the column later versions had.
async fn legacy_file(dir: &TempDir, with_status: bool) -> PathBuf {
    let path = dir.path().join("pos.db");
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&options).await.unwrap();

    sqlx::query(LEGACY_PRODUCTS).execute(&mut conn).await.unwrap();
    sqlx::query(&format!(
        r#"
        CREATE TABLE sales (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          total_price INTEGER NOT NULL,
          items_json TEXT NOT NULL,
          discount_value REAL DEFAULT 0,
          discount_type TEXT,
          created_at DATETIME DEFAULT CURRENT_TIMESTAMP{}
        )
        "#,
        if with_status { ",\n          status TEXT" } else { "" }
    ))
    .execute(&mut conn)
    .await
    .unwrap();

    sqlx::query(
        r#"
        INSERT INTO products (id, name, price, stock, detail, barcode) VALUES
            (1, 'Tea', 250, 8, 'loose leaf', 'TEA-1'),
            (2, 'Scone', 400, 3, NULL, NULL),
            (3, 'Bun', 150, NULL, NULL, '')
        "#,
    )
    .execute(&mut conn)
    .await
    .unwrap();

    let tea_and_scone = r#"[{"id":1,"name":"Tea","price":250,"quantity":2,"stock":10},{"id":2,"name":"Scone","price":400,"quantity":1}]"#;
    let tea = r#"[{"id":1,"name":"Tea","price":250,"quantity":4}]"#;

    let columns = if with_status {
        "id, total_price, items_json, discount_value, discount_type, created_at, status"
    } else {
        "id, total_price, items_json, discount_value, discount_type, created_at"
    };
    let rows: [(i64, f64, &str, Option<f64>, Option<&str>, &str, &str); 2] = [
        (1, 810.0, tea_and_scone, Some(10.0), Some("percent"), "2024-05-01 09:30:00", "VOID"),
        (2, 800.0, tea, Some(2.0), Some("fixed"), "2024-05-02 14:00:00", "COMPLETED"),
    ];
    for (id, total, items, value, kind, at, status) in rows {
        let placeholders = if with_status { "?1, ?2, ?3, ?4, ?5, ?6, ?7" } else { "?1, ?2, ?3, ?4, ?5, ?6" };
        let sql = format!("INSERT INTO sales ({columns}) VALUES ({placeholders})");
        let mut query = sqlx::query(&sql)
            .bind(id)
            .bind(total)
            .bind(items)
            .bind(value)
            .bind(kind)
            .bind(at);
        if with_status {
            query = query.bind(status);
        }
        query.execute(&mut conn).await.unwrap();
    }

    conn.close().await.unwrap();
    path
}

async fn target(dir: &TempDir) -> Database {
    Database::new(DbConfig::new(dir.path().join("tally.db")))
        .await
        .unwrap()
}

fn assert_rejected(err: &DbError) {
    assert!(matches!(err, DbError::ImportRejected(_)), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

async fn is_empty(db: &Database) -> bool {
    db.products().get_all().await.unwrap().is_empty() && db.sales().get_all().await.unwrap().is_empty()
}

#[tokio::test]
async fn legacy_rows_become_readable_sales() {
    let dir = tempfile::tempdir().unwrap();
    let source = legacy_file(&dir, true).await;
    let db = target(&dir).await;

    let summary = db.import_legacy(&source).await.unwrap();
    assert_eq!(summary, ImportSummary { products: 3, sales: 2 });

    let tea = db.products().get_by_id(1).await.unwrap().unwrap();
    assert_eq!((tea.price_cents, tea.stock, tea.detail.as_str()), (250, 8, "loose leaf"));
    let scone = db.products().get_by_id(2).await.unwrap().unwrap();
    assert_eq!((scone.stock, scone.barcode.as_str()), (3, ""));
    assert_eq!(db.products().get_by_id(3).await.unwrap().unwrap().stock, 1);

    let first = db.sales().get_by_id(1).await.unwrap().unwrap();
    assert_eq!(first.status, SaleStatus::Void);
    assert_eq!(first.total_cents, 810);
    assert_eq!(first.discount, Some(Discount::percent(10)));
    assert_eq!(
        first.line_items,
        vec![CartItem::new(1, "Tea", 250, 2), CartItem::new(2, "Scone", 400, 1)]
    );
    assert_eq!(first.created_at.to_rfc3339(), "2024-05-01T09:30:00+00:00");

    let second = db.sales().get_by_id(2).await.unwrap().unwrap();
    assert_eq!(second.status, SaleStatus::Active);
    // Whole currency units in the old file
    assert_eq!(second.discount, Some(Discount::fixed(200)));
}

#[tokio::test]
async fn imported_sales_void_and_new_ids_follow_on() {
    let dir = tempfile::tempdir().unwrap();
    let source = legacy_file(&dir, true).await;
    let db = target(&dir).await;
    db.import_legacy(&source).await.unwrap();

    let receipt = db.transactions().void_sale(2).await.unwrap();
    assert_eq!(receipt.restored, vec![1]);
    assert_eq!(db.products().get_by_id(1).await.unwrap().unwrap().stock, 12);

    let err = db.transactions().void_sale(1).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::AlreadyVoided(1))));

    let sale = db
        .transactions()
        .create_sale(&[CartItem::new(3, "Bun", 150, 1)], None)
        .await
        .unwrap();
    assert_eq!(sale.sale_id, 3);
}

#[tokio::test]
async fn files_without_status_import_as_active() {
    let dir = tempfile::tempdir().unwrap();
    let source = legacy_file(&dir, false).await;
    let db = target(&dir).await;

    db.import_legacy(&source).await.unwrap();

    let ledger = db.analytics().full_ledger().await.unwrap();
    assert_eq!(ledger.len(), 2);
    assert!(ledger.iter().all(|sale| sale.status == SaleStatus::Active));
}

#[tokio::test]
async fn second_import_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let source = legacy_file(&dir, true).await;
    let db = target(&dir).await;

    db.import_legacy(&source).await.unwrap();
    let err = db.import_legacy(&source).await.unwrap_err();

    assert_rejected(&err);
    assert_eq!(db.sales().get_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn unusable_sources_leave_the_target_empty() {
    let dir = tempfile::tempdir().unwrap();
    let db = target(&dir).await;

    let err = db.import_legacy(Path::new("/nonexistent/pos.db")).await.unwrap_err();
    assert_rejected(&err);

    // A database with a catalog but no ledger
    let partial = dir.path().join("partial.db");
    let options = SqliteConnectOptions::new()
        .filename(&partial)
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
    sqlx::query(LEGACY_PRODUCTS).execute(&mut conn).await.unwrap();
    conn.close().await.unwrap();

    let err = db.import_legacy(&partial).await.unwrap_err();
    assert_rejected(&err);
    assert!(is_empty(&db).await);

    // The source was detached again; a good file still imports
    let source = legacy_file(&dir, true).await;
    assert_eq!(db.import_legacy(&source).await.unwrap().sales, 2);
}
