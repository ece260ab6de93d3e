use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use seedbank_core::{SelectionMethod, distribution, filter_and_select, select, shuffle};
use seedbank_generate::{
    GenerationOutcome, GenerationRequest, InferredSchema, WriteMode, entity_metadata,
    infer::EXAMPLE_LIMIT,
};
use seedbank_store::WriteOutcome;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_CATEGORY_KEY: &str = "category";

#[derive(Debug, Deserialize)]
pub struct LoadParams {
    pub project_key: String,
    pub entity_type: String,
    #[serde(default = "default_seed")]
    pub seed_value: u64,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub filter_key: Option<String>,
    #[serde(default)]
    pub filter_values: Option<String>,
}

fn default_seed() -> u64 {
    1
}

fn default_limit() -> usize {
    10
}

/// Load a pool and return a deterministic subset for the requested seed.
///
/// With the dynamic-selection flag off, the full pool is returned
/// unaltered and the seed is ignored.
pub async fn load(
    State(state): State<AppState>,
    Query(params): Query<LoadParams>,
) -> Result<Json<Value>, ApiError> {
    let pool = state
        .store
        .load(&params.project_key, Some(&params.entity_type));
    if pool.is_empty() {
        return Err(ApiError::NotFound(format!(
            "no pool for {}/{}",
            params.project_key, params.entity_type
        )));
    }
    let total = pool.len();

    let method = match params.method.as_deref() {
        Some(name) => name.parse::<SelectionMethod>()?,
        None => SelectionMethod::default(),
    };

    let data = if !state.config.dynamic_v2_mode {
        pool
    } else {
        let seed = params.seed_value;
        let limit = params.limit;
        match method {
            SelectionMethod::Select => select(&pool, seed, limit, false),
            SelectionMethod::Shuffle => shuffle(&pool, seed, Some(limit)),
            SelectionMethod::Filter => {
                let key = params.filter_key.as_deref().ok_or_else(|| {
                    ApiError::BadRequest("filter_key is required for method=filter".to_string())
                })?;
                let values = parse_filter_values(params.filter_values.as_deref());
                filter_and_select(&pool, seed, limit, key, &values)
            }
            SelectionMethod::Distribute => {
                let key = params.filter_key.as_deref().unwrap_or(DEFAULT_CATEGORY_KEY);
                distribution(&pool, seed, key, limit)
            }
        }
    };

    let count = data.len();
    Ok(Json(json!({
        "metadata": {
            "source": "file",
            "projectKey": params.project_key,
            "entityType": params.entity_type,
            "seed": params.seed_value,
            "limit": params.limit,
            "method": method.as_str(),
            "filterKey": params.filter_key,
            "filterValues": params.filter_values,
            "totalAvailable": total,
        },
        "data": data,
        "count": count,
    })))
}

fn parse_filter_values(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// List every `(project, entity)` pool with file and record counts.
pub async fn pools(State(state): State<AppState>) -> Json<Value> {
    let pools = state.store.pools();
    Json(json!({"count": pools.len(), "pools": pools}))
}

/// Full generation request: the caller supplies the structural
/// description and examples directly.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let generator = state.generator()?;
    let outcome = generator.generate(&request).await?;

    let saved_path = if request.save_to_file {
        match (&request.project_key, &request.entity_type) {
            (Some(project), Some(entity)) => {
                persist(&state, project, entity, WriteMode::Append, &outcome).await
            }
            _ => {
                warn!("save_to_file set without project_key/entity_type, skipping persistence");
                Value::Null
            }
        }
    } else {
        Value::Null
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "count": outcome.records.len(),
            "data": outcome.records,
            "elapsed_seconds": outcome.elapsed.as_secs_f64(),
            "saved_path": saved_path,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct SmartGenerateBody {
    pub project_key: String,
    pub entity_type: String,
    #[serde(default = "default_smart_count")]
    pub count: u32,
    #[serde(default)]
    pub mode: WriteMode,
    #[serde(default)]
    pub additional_requirements: Option<String>,
}

fn default_smart_count() -> u32 {
    50
}

/// Smart generation: infer the structure from the entity's own pool,
/// enrich the prompt from the static metadata table, generate, persist.
pub async fn generate_smart(
    State(state): State<AppState>,
    Json(body): Json<SmartGenerateBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let generator = state.generator()?;

    let examples: Vec<Value> = state
        .store
        .load_primary(&body.project_key, &body.entity_type)
        .unwrap_or_default()
        .into_iter()
        .take(EXAMPLE_LIMIT)
        .collect();
    if examples.is_empty() {
        return Err(ApiError::NotFound(format!(
            "example data missing: {}/{}",
            body.project_key, body.entity_type
        )));
    }

    let schema = InferredSchema::from_examples(&body.entity_type, &examples)?;
    let metadata = entity_metadata(&body.project_key, &body.entity_type);

    let mut requirements = metadata.guidance.to_string();
    if let Some(extra) = body
        .additional_requirements
        .as_deref()
        .filter(|text| !text.trim().is_empty())
    {
        requirements.push('\n');
        requirements.push_str(extra.trim());
    }

    let request = GenerationRequest {
        interface_definition: schema.render(),
        examples,
        count: body.count,
        categories: metadata.categories.iter().map(|c| c.to_string()).collect(),
        additional_requirements: Some(requirements),
        json_schema: None,
        naming_rules: Some(BTreeMap::from([(
            "id".to_string(),
            format!("{}-{{number}}", body.entity_type),
        )])),
        project_key: Some(body.project_key.clone()),
        entity_type: Some(body.entity_type.clone()),
        save_to_file: true,
    };

    let outcome = generator.generate_smart(&request).await?;
    let saved_path = persist(
        &state,
        &body.project_key,
        &body.entity_type,
        body.mode,
        &outcome,
    )
    .await;

    info!(
        project = %body.project_key,
        entity = %body.entity_type,
        generated = outcome.records.len(),
        mode = ?body.mode,
        "smart generation finished"
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "count": outcome.records.len(),
            "data": outcome.records,
            "elapsed_seconds": outcome.elapsed.as_secs_f64(),
            "saved_path": saved_path,
        })),
    ))
}

/// Best-effort persistence: a write failure keeps the generated data in
/// the response, with `saved_path` null.
async fn persist(
    state: &AppState,
    project_key: &str,
    entity_type: &str,
    mode: WriteMode,
    outcome: &GenerationOutcome,
) -> Value {
    let written: Result<WriteOutcome, _> = match mode {
        WriteMode::Append => {
            state
                .store
                .append(project_key, entity_type, outcome.records.clone())
                .await
        }
        WriteMode::Replace => {
            state
                .store
                .rollover(project_key, entity_type, outcome.records.clone())
                .await
        }
    };
    match written {
        Ok(result) => json!(result.path.display().to_string()),
        Err(err) => {
            warn!(
                project = %project_key,
                entity = %entity_type,
                error = %err,
                "persisting generated records failed"
            );
            Value::Null
        }
    }
}
