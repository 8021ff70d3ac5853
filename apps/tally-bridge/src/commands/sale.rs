//! # Sale Commands
//!
//! Checkout and void. Both run as one all-or-nothing unit of work inside
//! `tally-db`; the commands only translate the payload and the outcome.
//!
//! ```text
//! createSale {items:[{productId,name,unitPriceCents,quantity}], discount?}
//!     → {saleId, finalTotalCents}
//!
//! voidSale {saleId}
//!     → {saleId, restored:[productId], skipped:[productId]}
//! ```
//!
//! The cart lines carry the name and price the cashier saw; those are what
//! the sale freezes, not whatever the catalog holds at commit time.

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{parse_payload, to_data, CommandResult};
use crate::state::BridgeState;
use tally_core::{CartItem, Discount, SaleId};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleInput {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub discount: Option<Discount>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoidSaleInput {
    pub sale_id: SaleId,
}

/// Records a sale and decrements stock.
pub async fn create_sale(state: &BridgeState, payload: Value) -> CommandResult {
    let input: CreateSaleInput = parse_payload(payload)?;

    let receipt = state
        .db()
        .transactions()
        .create_sale(&input.items, input.discount)
        .await?;

    info!(
        sale_id = receipt.sale_id,
        total_cents = receipt.final_total_cents,
        "Checkout complete"
    );
    to_data(receipt)
}

/// Marks a sale void and gives its stock back.
pub async fn void_sale(state: &BridgeState, payload: Value) -> CommandResult {
    let VoidSaleInput { sale_id } = parse_payload(payload)?;

    let receipt = state.db().transactions().void_sale(sale_id).await?;

    to_data(receipt)
}
