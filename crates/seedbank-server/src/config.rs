use std::path::PathBuf;
use std::str::FromStr;

/// Service configuration, sourced from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string; event endpoints answer 503 without it.
    pub database_url: Option<String>,
    /// Root directory of the pool layout.
    pub data_base_path: PathBuf,
    /// Completion backend key; generation endpoints answer 500 without it.
    pub openai_api_key: Option<String>,
    /// Gates seeded selection in `/datasets/load`; off serves full pools.
    pub dynamic_v2_mode: bool,
    pub db_pool_min: u32,
    pub db_pool_max: u32,
    /// Responses below this size are not gzip-compressed.
    pub gzip_min_size: u16,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            data_base_path: PathBuf::from("/app/data"),
            openai_api_key: None,
            dynamic_v2_mode: false,
            db_pool_min: 10,
            db_pool_max: 50,
            gzip_min_size: 500,
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: env_string("DATABASE_URL"),
            data_base_path: env_string("DATA_BASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_base_path),
            openai_api_key: env_string("OPENAI_API_KEY"),
            dynamic_v2_mode: env_truthy("ENABLE_DYNAMIC_V2_DB_MODE"),
            db_pool_min: env_parse("DB_POOL_MIN", defaults.db_pool_min),
            db_pool_max: env_parse("DB_POOL_MAX", defaults.db_pool_max),
            gzip_min_size: env_parse("GZIP_MIN_SIZE", defaults.gzip_min_size),
            host: env_string("APP_HOST").unwrap_or(defaults.host),
            port: env_parse("APP_PORT", defaults.port),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_truthy(name: &str) -> bool {
    env_string(name)
        .map(|value| matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"))
        .unwrap_or(false)
}

fn env_parse<T: FromStr + Copy>(name: &str, default: T) -> T {
    env_string(name)
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
