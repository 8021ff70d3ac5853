//! Drives the bridge through its wire protocol against an in-memory
//! database: one JSON request line in, one JSON response line out.

use serde_json::{json, Value};
use tally_bridge::handle_line;
use tally_bridge::state::{BridgeConfig, BridgeState};
use tally_db::{Database, DbConfig, StockPolicy};

async fn bridge_with(policy: StockPolicy) -> BridgeState {
    let db = Database::new(DbConfig::in_memory().stock_policy(policy))
        .await
        .unwrap();
    let mut config = BridgeConfig::with_database_path(":memory:");
    config.stock_policy = policy;
    BridgeState::new(db, config)
}

async fn bridge() -> BridgeState {
    bridge_with(StockPolicy::AllowNegative).await
}

async fn send(state: &BridgeState, line: &str) -> Value {
    let out = handle_line(state, line).await;
    assert!(!out.contains('\n'), "response must be a single line: {out}");
    serde_json::from_str(&out).unwrap()
}

async fn call(state: &BridgeState, command: &str, payload: Value) -> Value {
    send(state, &json!({ "command": command, "payload": payload }).to_string()).await
}

/// Calls a command that must succeed and returns its data.
async fn ok(state: &BridgeState, command: &str, payload: Value) -> Value {
    let response = call(state, command, payload).await;
    assert_eq!(response["success"], true, "{command} failed: {response}");
    assert!(response.get("error").is_none());
    response["data"].clone()
}

/// Calls a command that must fail and returns its error code.
async fn fails(state: &BridgeState, command: &str, payload: Value) -> String {
    let response = call(state, command, payload).await;
    assert_eq!(response["success"], false, "{command} succeeded: {response}");
    assert!(response.get("data").is_none());
    response["error"]["code"].as_str().unwrap().to_string()
}

async fn add(state: &BridgeState, name: &str, price_cents: i64, stock: i64, barcode: &str) -> i64 {
    let data = ok(
        state,
        "addProduct",
        json!({ "name": name, "priceCents": price_cents, "stock": stock, "barcode": barcode }),
    )
    .await;
    data["id"].as_i64().unwrap()
}

fn line(product_id: i64, name: &str, unit_price_cents: i64, quantity: i64) -> Value {
    json!({
        "productId": product_id,
        "name": name,
        "unitPriceCents": unit_price_cents,
        "quantity": quantity
    })
}

async fn stock(state: &BridgeState, barcode: &str) -> i64 {
    let product = ok(state, "getProductByBarcode", json!({ "barcode": barcode })).await;
    product["stock"].as_i64().unwrap()
}

#[tokio::test]
async fn catalog_commands_round_trip() {
    let state = bridge().await;
    let latte = add(&state, "Oat Latte", 450, 20, "1001").await;
    add(&state, "Bagel", 300, 5, "2001").await;

    let page = ok(&state, "searchProducts", json!({ "searchTerm": "latte" })).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["page"], 1);
    assert_eq!(page["products"][0]["id"], latte);
    assert_eq!(page["products"][0]["priceCents"], 450);

    let updated = ok(
        &state,
        "updateProduct",
        json!({
            "id": latte,
            "name": "Oat Latte",
            "priceCents": 475,
            "stock": 18,
            "detail": "",
            "barcode": "1001"
        }),
    )
    .await;
    assert_eq!(updated["affected"], 1);
    assert_eq!(stock(&state, "1001").await, 18);

    let missing = ok(
        &state,
        "updateProduct",
        json!({ "id": 9999, "name": "Ghost", "priceCents": 1, "stock": 0, "detail": "", "barcode": "" }),
    )
    .await;
    assert_eq!(missing["affected"], 0);

    let deleted = ok(&state, "deleteProduct", json!({ "id": latte })).await;
    assert_eq!(deleted["affected"], 1);

    // No payload at all is fine for commands without inputs
    let all = send(&state, r#"{"command":"getAllProducts"}"#).await;
    assert_eq!(all["success"], true);
    assert_eq!(all["data"].as_array().unwrap().len(), 1);
    assert_eq!(all["data"][0]["name"], "Bagel");

    assert_eq!(
        fails(&state, "getProductByBarcode", json!({ "barcode": "1001" })).await,
        "NOT_FOUND"
    );
}

#[tokio::test]
async fn partial_update_is_rejected_and_keeps_the_row() {
    let state = bridge().await;
    let data = ok(
        &state,
        "addProduct",
        json!({ "name": "Tea", "priceCents": 250, "stock": 40, "detail": "loose leaf", "barcode": "TEA-1" }),
    )
    .await;
    let id = data["id"].as_i64().unwrap();

    let code = fails(
        &state,
        "updateProduct",
        json!({ "id": id, "name": "Tea", "priceCents": 300 }),
    )
    .await;
    assert_eq!(code, "BAD_REQUEST");

    let product = ok(&state, "getProductByBarcode", json!({ "barcode": "TEA-1" })).await;
    assert_eq!(product["stock"], 40);
    assert_eq!(product["detail"], "loose leaf");
    assert_eq!(product["priceCents"], 250);
}

#[tokio::test]
async fn duplicate_barcode_is_a_conflict() {
    let state = bridge().await;
    add(&state, "Espresso", 250, 10, "3001").await;

    let code = fails(
        &state,
        "addProduct",
        json!({ "name": "Double Espresso", "priceCents": 350, "barcode": "3001" }),
    )
    .await;
    assert_eq!(code, "CONFLICT");

    // Empty barcodes may repeat
    add(&state, "Water", 100, 10, "").await;
    add(&state, "Sparkling Water", 150, 10, "").await;
}

#[tokio::test]
async fn sale_void_and_analytics() {
    let state = bridge().await;
    let a = add(&state, "Cold Brew", 500, 10, "A1").await;
    let b = add(&state, "Bagel", 1000, 3, "B1").await;

    let receipt = ok(
        &state,
        "createSale",
        json!({
            "items": [line(a, "Cold Brew", 500, 2), line(b, "Bagel", 1000, 1)],
            "discount": { "kind": "percent", "value": 10 }
        }),
    )
    .await;
    assert_eq!(receipt["finalTotalCents"], 1800);
    let sale_id = receipt["saleId"].as_i64().unwrap();

    assert_eq!(stock(&state, "A1").await, 8);
    assert_eq!(stock(&state, "B1").await, 2);

    let snapshot = ok(&state, "getAnalyticsSnapshot", Value::Null).await;
    assert_eq!(snapshot["todayRevenueCents"], 1800);
    assert_eq!(snapshot["todayOrderCount"], 1);
    assert_eq!(snapshot["recentSales"][0]["status"], "active");

    let voided = ok(&state, "voidSale", json!({ "saleId": sale_id })).await;
    assert_eq!(voided["skipped"], json!([]));
    assert_eq!(stock(&state, "A1").await, 10);
    assert_eq!(stock(&state, "B1").await, 3);

    let snapshot = ok(&state, "getAnalyticsSnapshot", json!({ "limit": 5 })).await;
    assert_eq!(snapshot["todayRevenueCents"], 0);
    assert_eq!(snapshot["todayOrderCount"], 0);
    assert_eq!(snapshot["recentSales"][0]["status"], "void");

    assert_eq!(fails(&state, "voidSale", json!({ "saleId": sale_id })).await, "CONFLICT");
    assert_eq!(fails(&state, "voidSale", json!({ "saleId": 4242 })).await, "NOT_FOUND");
}

#[tokio::test]
async fn fixed_discount_is_in_cents_and_floors_at_zero() {
    let state = bridge().await;
    let tea = add(&state, "Tea", 250, 10, "T1").await;

    let receipt = ok(
        &state,
        "createSale",
        json!({
            "items": [line(tea, "Tea", 250, 4)],
            "discount": { "kind": "fixed", "value": 300 }
        }),
    )
    .await;
    assert_eq!(receipt["finalTotalCents"], 700);

    let receipt = ok(
        &state,
        "createSale",
        json!({
            "items": [line(tea, "Tea", 250, 1)],
            "discount": { "kind": "fixed", "value": 5000 }
        }),
    )
    .await;
    assert_eq!(receipt["finalTotalCents"], 0);
}

#[tokio::test]
async fn rejected_input_changes_nothing() {
    let state = bridge().await;
    let tea = add(&state, "Tea", 250, 10, "T1").await;

    assert_eq!(
        fails(&state, "createSale", json!({ "items": [] })).await,
        "VALIDATION_ERROR"
    );
    assert_eq!(
        fails(
            &state,
            "createSale",
            json!({
                "items": [line(tea, "Tea", 250, 1)],
                "discount": { "kind": "percent", "value": 150 }
            }),
        )
        .await,
        "VALIDATION_ERROR"
    );
    assert_eq!(
        fails(&state, "createSale", json!({ "items": [line(7777, "Ghost", 100, 1)] })).await,
        "NOT_FOUND"
    );
    assert_eq!(
        fails(&state, "searchProducts", json!({ "page": -1 })).await,
        "VALIDATION_ERROR"
    );
    assert_eq!(
        fails(&state, "addProduct", json!({ "name": "  ", "priceCents": 100 })).await,
        "VALIDATION_ERROR"
    );

    assert_eq!(stock(&state, "T1").await, 10);
    let ledger = ok(&state, "getFullLedger", Value::Null).await;
    assert!(ledger.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reject_oversell_policy_reports_conflict() {
    let state = bridge_with(StockPolicy::RejectOversell).await;
    let scone = add(&state, "Scone", 400, 2, "S1").await;

    let code = fails(
        &state,
        "createSale",
        json!({ "items": [line(scone, "Scone", 400, 3)] }),
    )
    .await;
    assert_eq!(code, "CONFLICT");
    assert_eq!(stock(&state, "S1").await, 2);

    let health = ok(&state, "healthCheck", Value::Null).await;
    assert_eq!(health["stockPolicy"], "reject-oversell");
}

#[tokio::test]
async fn export_flattens_ledger_per_line() {
    let state = bridge().await;
    let tea = add(&state, "Tea", 250, 10, "T1").await;
    let scone = add(&state, "Scone", 400, 10, "S1").await;

    let receipt = ok(
        &state,
        "createSale",
        json!({ "items": [line(tea, "Tea", 250, 2), line(scone, "Scone", 400, 1)] }),
    )
    .await;
    ok(&state, "voidSale", json!({ "saleId": receipt["saleId"] })).await;
    ok(&state, "createSale", json!({ "items": [line(tea, "Tea", 250, 1)] })).await;

    let rows = ok(&state, "exportLedger", Value::Null).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);

    // Newest sale first, voided sale kept with its status
    assert_eq!(rows[0]["itemName"], "Tea");
    assert_eq!(rows[0]["status"], "active");
    assert_eq!(rows[1]["saleId"], receipt["saleId"]);
    assert_eq!(rows[1]["lineTotal"], 500);
    assert_eq!(rows[1]["status"], "void");
    assert_eq!(rows[2]["itemName"], "Scone");
    assert_eq!(rows[2]["unitPrice"], 400);
}

#[tokio::test]
async fn malformed_lines_and_unknown_commands_are_bad_requests() {
    let state = bridge().await;

    let response = send(&state, "not json").await;
    assert_eq!(response["success"], false);
    assert_eq!(response["error"]["code"], "BAD_REQUEST");

    let response = send(&state, r#"{"command":"refundSale","payload":{}}"#).await;
    assert_eq!(response["error"]["code"], "BAD_REQUEST");
    assert!(response["error"]["message"].as_str().unwrap().contains("refundSale"));

    // Wrong payload shape
    assert_eq!(
        fails(&state, "voidSale", json!({ "sale": 1 })).await,
        "BAD_REQUEST"
    );
}

#[tokio::test]
async fn health_check_reports_current_schema() {
    let state = bridge().await;

    let health = ok(&state, "healthCheck", Value::Null).await;
    assert_eq!(health["database"], true);
    assert_eq!(health["migrations"]["total"], health["migrations"]["applied"]);
    assert_eq!(health["stockPolicy"], "allow-negative");
}
