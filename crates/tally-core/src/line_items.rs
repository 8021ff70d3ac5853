//! # Line-Item Snapshot Codec
//!
//! The ledger stores each sale's cart as an opaque text blob. The ledger
//! itself never looks inside; this module is the only place that writes or
//! reads the format.
//!
//! ## Format
//! ```text
//! current (written by this build):
//!   {"schema":"v1","items":[{"productId":1,"name":"Tea","unitPriceCents":250,"quantity":2}]}
//!
//! legacy (read only; copied verbatim by `tally_db::legacy_import`):
//!   [{"id":1,"name":"Tea","price":250,"quantity":2}]
//! ```
//!
//! A new schema gets a new `schema` tag and a new variant here; old rows
//! keep decoding through their own variant.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{CartItem, ProductId};

/// Tag written into every blob produced by [`encode`].
pub const CURRENT_SCHEMA: &str = "v1";

#[derive(Serialize)]
#[serde(tag = "schema")]
enum EncodeBlob<'a> {
    #[serde(rename = "v1")]
    V1 { items: &'a [CartItem] },
}

#[derive(Deserialize)]
#[serde(tag = "schema")]
enum VersionedBlob {
    #[serde(rename = "v1")]
    V1 { items: Vec<CartItem> },
}

#[derive(Deserialize)]
struct LegacyItem {
    id: ProductId,
    name: String,
    price: i64,
    quantity: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnyBlob {
    Versioned(VersionedBlob),
    Legacy(Vec<LegacyItem>),
}

/// Serializes a cart snapshot in the current schema.
pub fn encode(items: &[CartItem]) -> CoreResult<String> {
    serde_json::to_string(&EncodeBlob::V1 { items })
        .map_err(|e| CoreError::UnsupportedLineItems(e.to_string()))
}

/// Reads a stored snapshot in any supported schema.
pub fn decode(blob: &str) -> CoreResult<Vec<CartItem>> {
    let parsed: AnyBlob = serde_json::from_str(blob).map_err(|_| {
        CoreError::UnsupportedLineItems(format!(
            "expected a '{}' snapshot or a legacy item array",
            CURRENT_SCHEMA
        ))
    })?;

    let items = match parsed {
        AnyBlob::Versioned(VersionedBlob::V1 { items }) => items,
        AnyBlob::Legacy(items) => items
            .into_iter()
            .map(|item| CartItem {
                product_id: item.id,
                name: item.name,
                unit_price_cents: item.price,
                quantity: item.quantity,
            })
            .collect(),
    };

    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================
