use axum::{extract::State, Json};
use serde_json::{json, Value};

use tradecraft_shared::db::pool::health_check;

use crate::app::AppState;

/// Liveness endpoint. Reports database reachability without failing the
/// request, so load balancers can tell "up but degraded" from "down".
pub async fn health_check_handler(State(state): State<AppState>) -> Json<Value> {
    let database = match health_check(&state.db).await {
        Ok(()) => "ok",
        Err(_) => "unreachable",
    };

    Json(json!({
        "status": "ok",
        "database": database,
        "version": tradecraft_shared::VERSION,
    }))
}
