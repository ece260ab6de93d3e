use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde_json::{Value, json};

use crate::state::AppState;

/// Pool liveness probe. Never errors: a missing or unreachable database
/// reports as degraded instead.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let operational = match &state.db {
        Some(pool) => sqlx::query_scalar::<_, i32>("select 1")
            .fetch_one(pool)
            .await
            .is_ok(),
        None => false,
    };
    Json(json!({
        "status": if operational { "ok" } else { "degraded" },
        "database_pool_operational": operational,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
