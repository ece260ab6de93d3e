use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use seedbank_events::EventError;
use seedbank_generate::GenerationError;
use seedbank_store::StoreError;

/// Error surface of the HTTP facade; each variant owns a status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("{0}")]
    NotFound(String),
    #[error("record {index} failed schema validation: {message}")]
    SchemaValidation { index: usize, message: String },
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("database unavailable")]
    DatabaseUnavailable,
    #[error("database error: {message}")]
    Database {
        message: String,
        code: Option<String>,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::SchemaValidation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Generation(_) | ApiError::Database { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::InvalidUrl(_) => "invalid_url",
            ApiError::NotFound(_) => "not_found",
            ApiError::SchemaValidation { .. } => "schema_validation",
            ApiError::Generation(_) => "generation_failure",
            ApiError::DatabaseUnavailable => "database_unavailable",
            ApiError::Database { .. } => "database_error",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(kind = self.kind(), message = %self, "request failed");
        }
        let mut body = json!({"error": self.kind(), "message": self.to_string()});
        if let ApiError::SchemaValidation { index, .. } = &self {
            body["record_index"] = json!(index);
        }
        if let ApiError::Database {
            code: Some(code), ..
        } = &self
        {
            body["sql_state"] = json!(code);
        }
        (status, Json(body)).into_response()
    }
}

impl From<EventError> for ApiError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::InvalidUrl(message) => ApiError::InvalidUrl(message),
            EventError::Unavailable => ApiError::DatabaseUnavailable,
            EventError::Database { message, code } => ApiError::Database { message, code },
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::ExampleDataMissing(which) => {
                ApiError::NotFound(format!("example data missing: {which}"))
            }
            GenerationError::SchemaValidation { index, message } => {
                ApiError::SchemaValidation { index, message }
            }
            GenerationError::InvalidSchema(message) => {
                ApiError::BadRequest(format!("invalid json schema: {message}"))
            }
            GenerationError::MissingApiKey => ApiError::Generation(err.to_string()),
            GenerationError::Failure(_) | GenerationError::Parse(_) => {
                ApiError::Generation(err.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<seedbank_core::Error> for ApiError {
    fn from(err: seedbank_core::Error) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
