use axum::Json;
use axum::extract::Query;
use serde::Deserialize;
use serde_json::Value;

use seedbank_core::{DimensionConfig, SeedFlags, resolve_seeds};

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    #[serde(alias = "seed_value")]
    pub base: i64,
    #[serde(default = "enabled")]
    pub v1_enabled: bool,
    #[serde(default = "enabled")]
    pub v2_enabled: bool,
    #[serde(default = "enabled")]
    pub v3_enabled: bool,
    #[serde(default)]
    pub v1_config: Option<DimensionConfig>,
    /// Accepted for wire compatibility; v2 always resolves to the base.
    #[serde(default)]
    pub v2_config: Option<DimensionConfig>,
    #[serde(default)]
    pub v3_config: Option<DimensionConfig>,
}

fn enabled() -> bool {
    true
}

fn resolve(params: ResolveParams) -> Json<Value> {
    let ResolveParams {
        base,
        v1_enabled,
        v2_enabled,
        v3_enabled,
        v1_config,
        v2_config: _,
        v3_config,
    } = params;
    let resolved = resolve_seeds(
        base,
        SeedFlags {
            v1: v1_enabled,
            v2: v2_enabled,
            v3: v3_enabled,
        },
        v1_config,
        v3_config,
    );
    Json(serde_json::json!({
        "base": resolved.base,
        "v1": resolved.v1,
        "v2": resolved.v2,
        "v3": resolved.v3,
    }))
}

/// `GET /seeds/resolve` with query-string parameters.
pub async fn resolve_query(Query(params): Query<ResolveParams>) -> Json<Value> {
    resolve(params)
}

/// `POST /seeds/resolve` with a JSON body, which additionally accepts
/// per-dimension configs.
pub async fn resolve_body(Json(params): Json<ResolveParams>) -> Json<Value> {
    resolve(params)
}
