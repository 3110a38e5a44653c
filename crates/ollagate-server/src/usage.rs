use axum::Json;
use axum::extract::State;
use ollagate_usage::{UsageLedger, UsageSnapshot};

/// Handle `GET /usage`
pub async fn usage_handler(State(ledger): State<UsageLedger>) -> Json<UsageSnapshot> {
    Json(ledger.snapshot())
}
