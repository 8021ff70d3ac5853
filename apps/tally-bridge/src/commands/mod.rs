//! # Commands Module
//!
//! Every operation exposed to the presentation layer.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (envelope + dispatch)
//! ├── product.rs    ◄─── addProduct, updateProduct, deleteProduct,
//! │                      getAllProducts, searchProducts, getProductByBarcode
//! ├── sale.rs       ◄─── createSale, voidSale
//! └── analytics.rs  ◄─── getAnalyticsSnapshot, getFullLedger,
//!                        exportLedger, healthCheck
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  {"command":"searchProducts","payload":{"searchTerm":"latte"}}          │
//! │         │                                                               │
//! │         ▼  serde_json::from_str::<Request>     (fails → BAD_REQUEST)   │
//! │  dispatch(state, request)                                               │
//! │         │  match command name                  (unknown → BAD_REQUEST) │
//! │         ▼                                                               │
//! │  product::search_products(state, payload)                               │
//! │         │  payload → typed input                (fails → BAD_REQUEST)  │
//! │         │  tally-db call                        (fails → ApiError)     │
//! │         ▼                                                               │
//! │  {"success":true,"data":{"products":[...],"total":3,...}}               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod analytics;
pub mod product;
pub mod sale;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::error::ApiError;
use crate::state::BridgeState;

/// Result type for command handlers.
pub type CommandResult = Result<Value, ApiError>;

/// One request line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub command: String,
    #[serde(default)]
    pub payload: Value,
}

/// One response line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Response {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        Response {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

impl From<CommandResult> for Response {
    fn from(result: CommandResult) -> Self {
        match result {
            Ok(data) => Response::ok(data),
            Err(error) => Response::err(error),
        }
    }
}

/// Parses one request line, runs it, and renders the response line
/// (without the trailing newline).
pub async fn handle_line(state: &BridgeState, line: &str) -> String {
    let response = match serde_json::from_str::<Request>(line) {
        Ok(request) => dispatch(state, request).await,
        Err(e) => {
            warn!(error = %e, "Malformed request line");
            Response::err(ApiError::bad_request(format!("Malformed request: {}", e)))
        }
    };

    serde_json::to_string(&response).unwrap_or_else(|e| {
        error!(error = %e, "Response could not be serialized");
        r#"{"success":false,"error":{"code":"INTERNAL","message":"Response could not be serialized"}}"#
            .to_string()
    })
}

/// Routes a request to its command handler.
pub async fn dispatch(state: &BridgeState, request: Request) -> Response {
    let start = Instant::now();
    let Request { command, payload } = request;

    let result = match command.as_str() {
        // Catalog
        "addProduct" => product::add_product(state, payload).await,
        "updateProduct" => product::update_product(state, payload).await,
        "deleteProduct" => product::delete_product(state, payload).await,
        "getAllProducts" => product::get_all_products(state).await,
        "searchProducts" => product::search_products(state, payload).await,
        "getProductByBarcode" => product::get_product_by_barcode(state, payload).await,
        // Sales
        "createSale" => sale::create_sale(state, payload).await,
        "voidSale" => sale::void_sale(state, payload).await,
        // Analytics & reporting
        "getAnalyticsSnapshot" => analytics::get_analytics_snapshot(state, payload).await,
        "getFullLedger" => analytics::get_full_ledger(state).await,
        "exportLedger" => analytics::export_ledger(state).await,
        "healthCheck" => analytics::health_check(state).await,
        other => Err(ApiError::bad_request(format!("Unknown command: {}", other))),
    };

    debug!(
        command = %command,
        success = result.is_ok(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Command handled"
    );

    result.into()
}

/// Deserializes a command payload into its typed input.
///
/// A missing payload is treated as `{}` so commands whose fields are all
/// optional can be sent without one.
pub(crate) fn parse_payload<T: DeserializeOwned>(payload: Value) -> Result<T, ApiError> {
    let payload = match payload {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };

    serde_json::from_value(payload)
        .map_err(|e| ApiError::bad_request(format!("Invalid payload: {}", e)))
}

/// Serializes a command's output.
pub(crate) fn to_data<T: Serialize>(value: T) -> CommandResult {
    serde_json::to_value(value).map_err(|e| {
        error!(error = %e, "Command output could not be serialized");
        ApiError::internal("Response could not be serialized")
    })
}
