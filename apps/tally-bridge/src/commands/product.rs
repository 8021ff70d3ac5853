//! # Product Commands
//!
//! Catalog maintenance and lookup.
//!
//! ## Search Flow
//! ```text
//! {"command":"searchProducts","payload":{"searchTerm":"latte","page":2,"pageSize":20}}
//!       │
//!       ▼
//! page / pageSize checked (1-based, size 1..=500)
//!       │
//!       ▼
//! name OR barcode contains term, newest first, LIMIT/OFFSET
//!       │
//!       ▼
//! {"products":[...],"total":57,"page":2,"pageSize":20}
//! ```
//!
//! A barcode scanner goes through `getProductByBarcode` instead, which is
//! an exact match.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{parse_payload, to_data, CommandResult};
use crate::error::ApiError;
use crate::state::BridgeState;
use tally_core::{NewProduct, Product, ProductId};

/// Page size used when `searchProducts` does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductIdInput {
    pub id: ProductId,
}

/// `searchProducts` input.
///
/// Page numbers arrive as signed integers so that a negative page is a
/// validation failure rather than a malformed payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProductsInput {
    #[serde(default)]
    pub search_term: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeInput {
    pub barcode: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedDto {
    pub id: ProductId,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedDto {
    pub affected: u64,
}

/// Adds a product and returns its id.
pub async fn add_product(state: &BridgeState, payload: Value) -> CommandResult {
    let product: NewProduct = parse_payload(payload)?;

    let id = state.db().products().add(&product).await?;

    info!(id, name = %product.name, "Product added");
    to_data(CreatedDto { id })
}

/// Overwrites a product. `affected` is 0 when the id is unknown.
///
/// The payload is a whole `Product`; leaving out any field is a bad
/// request, never an overwrite with a default.
pub async fn update_product(state: &BridgeState, payload: Value) -> CommandResult {
    let product: Product = parse_payload(payload)?;

    let affected = state.db().products().update(&product).await?;

    debug!(id = product.id, affected, "Product updated");
    to_data(AffectedDto { affected })
}

/// Deletes a product. `affected` is 0 when the id is unknown.
pub async fn delete_product(state: &BridgeState, payload: Value) -> CommandResult {
    let ProductIdInput { id } = parse_payload(payload)?;

    let affected = state.db().products().delete(id).await?;

    info!(id, affected, "Product deleted");
    to_data(AffectedDto { affected })
}

/// Every product, newest first.
pub async fn get_all_products(state: &BridgeState) -> CommandResult {
    let products = state.db().products().get_all().await?;
    to_data(products)
}

/// One page of products matching an optional term.
pub async fn search_products(state: &BridgeState, payload: Value) -> CommandResult {
    let input: SearchProductsInput = parse_payload(payload)?;

    let term = input.search_term.unwrap_or_default();
    // Values outside u32 become 0, which the page validation rejects
    let page = input.page.map_or(1, |p| u32::try_from(p).unwrap_or(0));
    let page_size = input
        .page_size
        .map_or(DEFAULT_PAGE_SIZE, |s| u32::try_from(s).unwrap_or(0));

    let result = state
        .db()
        .products()
        .search(&term, page, page_size)
        .await?;

    debug!(
        term = %term,
        page,
        page_size,
        total = result.total,
        "Search completed"
    );
    to_data(result)
}

/// Exact barcode lookup.
pub async fn get_product_by_barcode(state: &BridgeState, payload: Value) -> CommandResult {
    let BarcodeInput { barcode } = parse_payload(payload)?;

    let product = state
        .db()
        .products()
        .get_by_barcode(&barcode)
        .await?
        .ok_or_else(|| ApiError::not_found("Product with barcode", barcode.trim()))?;

    to_data(product)
}
