use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use seedbank_events::{
    EventFilter, NewEvent, delete_events, fetch_events, insert_event, normalize_origin,
};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveEventBody {
    pub web_url: String,
    #[serde(default)]
    pub web_agent_id: Option<String>,
    #[serde(default)]
    pub validator_id: Option<String>,
    pub data: Value,
}

pub async fn save_events(
    State(state): State<AppState>,
    Json(body): Json<SaveEventBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    // Validate the URL before touching the pool so malformed input is a
    // 400 even while the database is down.
    normalize_origin(&body.web_url)?;
    let pool = state.db()?;
    let stored = insert_event(
        pool,
        NewEvent {
            web_url: body.web_url,
            web_agent_id: body.web_agent_id,
            validator_id: body.validator_id,
            data: body.data,
        },
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "event_id": stored.id,
            "created_at": stored.created_at,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub web_agent_id: Option<String>,
    #[serde(default)]
    pub validator_id: Option<String>,
}

impl EventQuery {
    fn into_filter(self) -> Result<EventFilter, ApiError> {
        let web_url = self
            .web_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("web_url is required".to_string()))?;
        Ok(EventFilter::for_read(
            &web_url,
            self.web_agent_id,
            self.validator_id,
        )?)
    }
}

pub async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = query.into_filter()?;
    let pool = state.db()?;
    let events = fetch_events(pool, &filter).await?;
    Ok(Json(json!({"count": events.len(), "events": events})))
}

pub async fn reset_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = query.into_filter()?;
    let pool = state.db()?;
    let deleted = delete_events(pool, &filter).await?;
    Ok(Json(json!({"deleted": deleted})))
}
