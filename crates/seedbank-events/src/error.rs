use thiserror::Error;

/// Errors raised by the event log.
#[derive(Debug, Error)]
pub enum EventError {
    /// The input URL has no scheme or host and cannot name an origin.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// No connection could be acquired from the pool.
    #[error("database unavailable")]
    Unavailable,
    /// A query failed; `code` carries the SQL state when known.
    #[error("database error: {message}")]
    Database {
        message: String,
        code: Option<String>,
    },
}

impl From<sqlx::Error> for EventError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => EventError::Unavailable,
            other => {
                let code = match &other {
                    sqlx::Error::Database(db) => db.code().map(|code| code.to_string()),
                    _ => None,
                };
                EventError::Database {
                    message: other.to_string(),
                    code,
                }
            }
        }
    }
}
