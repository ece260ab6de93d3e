use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use crate::error::EventError;
use crate::origin::normalize_origin;

/// Sentinel agent id when a writer or reader names none.
pub const UNKNOWN_AGENT: &str = "UNKNOWN_AGENT";
/// Validator sentinel applied on writes.
pub const DEFAULT_WRITE_VALIDATOR: &str = "1";
/// Validator sentinel applied on reads and resets.
pub const UNKNOWN_VALIDATOR: &str = "UNKNOWN_VALIDATOR";

const SCHEMA_SQL: &str = r#"
create table if not exists events (
    id bigserial primary key,
    web_agent_id text not null,
    web_url text not null,
    validator_id text not null,
    event_data jsonb not null,
    created_at timestamptz not null default now()
);
create index if not exists idx_events_triple on events (web_url, web_agent_id, validator_id);
create index if not exists idx_events_created_at on events (created_at);
"#;

const INSERT_EVENT: &str = r#"
insert into events (web_agent_id, web_url, validator_id, event_data)
values ($1, $2, $3, $4)
returning id, created_at
"#;

const SELECT_EVENTS: &str = r#"
select id, web_agent_id, web_url, validator_id, event_data, created_at
from events
where web_url = $1 and web_agent_id = $2 and validator_id = $3
order by created_at desc, id asc
"#;

const DELETE_EVENTS: &str = r#"
delete from events
where web_url = $1 and web_agent_id = $2 and validator_id = $3
"#;

/// One stored event row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub web_agent_id: String,
    pub web_url: String,
    pub validator_id: String,
    pub event_data: Value,
    pub created_at: DateTime<Utc>,
}

/// Identity of a freshly inserted event.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredEvent {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

/// Payload for an event write; missing ids take the write sentinels.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub web_url: String,
    pub web_agent_id: Option<String>,
    pub validator_id: Option<String>,
    pub data: Value,
}

/// Normalized query key for reads and resets.
#[derive(Debug, Clone)]
pub struct EventFilter {
    pub web_url: String,
    pub web_agent_id: String,
    pub validator_id: String,
}

impl EventFilter {
    /// Build a read/reset filter: the URL is normalized to its origin,
    /// missing ids take the read sentinels.
    pub fn for_read(
        web_url: &str,
        web_agent_id: Option<String>,
        validator_id: Option<String>,
    ) -> Result<Self, EventError> {
        Ok(Self {
            web_url: normalize_origin(web_url)?,
            web_agent_id: web_agent_id.unwrap_or_else(|| UNKNOWN_AGENT.to_string()),
            validator_id: validator_id.unwrap_or_else(|| UNKNOWN_VALIDATOR.to_string()),
        })
    }
}

/// Apply the events DDL. Idempotent; safe to run at every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), EventError> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

/// Insert one event, normalizing the URL to its origin and applying the
/// write sentinels for missing ids.
pub async fn insert_event(pool: &PgPool, event: NewEvent) -> Result<StoredEvent, EventError> {
    let origin = normalize_origin(&event.web_url)?;
    let agent = event
        .web_agent_id
        .unwrap_or_else(|| UNKNOWN_AGENT.to_string());
    let validator = event
        .validator_id
        .unwrap_or_else(|| DEFAULT_WRITE_VALIDATOR.to_string());

    let stored = sqlx::query_as::<_, StoredEvent>(INSERT_EVENT)
        .bind(&agent)
        .bind(&origin)
        .bind(&validator)
        .bind(&event.data)
        .fetch_one(pool)
        .await?;

    debug!(origin = %origin, agent = %agent, validator = %validator, id = stored.id, "event stored");
    Ok(stored)
}

/// Events matching the triple, newest first.
pub async fn fetch_events(
    pool: &PgPool,
    filter: &EventFilter,
) -> Result<Vec<EventRecord>, EventError> {
    let rows = sqlx::query_as::<_, EventRecord>(SELECT_EVENTS)
        .bind(&filter.web_url)
        .bind(&filter.web_agent_id)
        .bind(&filter.validator_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Delete every event matching the exact triple; returns the count.
pub async fn delete_events(pool: &PgPool, filter: &EventFilter) -> Result<u64, EventError> {
    let result = sqlx::query(DELETE_EVENTS)
        .bind(&filter.web_url)
        .bind(&filter.web_agent_id)
        .bind(&filter.validator_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
