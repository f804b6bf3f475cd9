use axum::{extract::State, http::StatusCode, response::Json};
use diesel::connection::SimpleConnection;
use serde_json::{json, Value};

use crate::state::AppState;

/// Liveness plus a database round-trip. Reports 503 when the pool cannot
/// hand out a working connection.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let database_up = match state.pool.get() {
        Ok(mut conn) => conn.batch_execute("SELECT 1").is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "health check could not reach the database");
            false
        }
    };

    if database_up {
        (StatusCode::OK, Json(json!({ "status": "ok", "database": "up" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "down" })),
        )
    }
}
