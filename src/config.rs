use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {key} value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argon2Config {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Argon2Config {
    fn default() -> Self {
        // Budget VPS friendly: 4MB memory, 3 iterations, 1 thread
        Self {
            memory_kib: 4 * 1024,
            iterations: 3,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    pub sqlx_logging: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 50,
            min_connections: 10,
            connect_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(1800),
            sqlx_logging: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub environment: String,
    pub database_url: String,
    pub pool: PoolConfig,
    pub story_sweep_interval: Duration,
    pub argon2: Argon2Config,
}

impl AppConfig {
    /// Loads `.env.{RUST_ENV}` (falling back to `.env`) and reads the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());

        // Try .env.{environment} first, then fall back to .env
        let env_file = format!(".env.{}", environment);
        if dotenvy::from_filename(&env_file).is_err() {
            dotenvy::dotenv().ok();
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let pool_defaults = PoolConfig::default();
        let argon2_defaults = Argon2Config::default();

        let pool = PoolConfig {
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", pool_defaults.max_connections)?,
            min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", pool_defaults.min_connections)?,
            connect_timeout: secs_or(&lookup, "DB_CONNECT_TIMEOUT_SECS", pool_defaults.connect_timeout)?,
            acquire_timeout: secs_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", pool_defaults.acquire_timeout)?,
            idle_timeout: secs_or(&lookup, "DB_IDLE_TIMEOUT_SECS", pool_defaults.idle_timeout)?,
            max_lifetime: secs_or(&lookup, "DB_MAX_LIFETIME_SECS", pool_defaults.max_lifetime)?,
            sqlx_logging: parse_or(&lookup, "SQLX_LOGGING", pool_defaults.sqlx_logging)?,
        };

        if pool.min_connections > pool.max_connections {
            return Err(ConfigError::Invalid {
                key: "DB_MIN_CONNECTIONS",
                value: pool.min_connections.to_string(),
            });
        }

        let story_sweep_interval =
            secs_or(&lookup, "STORY_SWEEP_INTERVAL_SECS", Duration::from_secs(300))?;
        if story_sweep_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "STORY_SWEEP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        let argon2 = Argon2Config {
            memory_kib: parse_or(&lookup, "ARGON2_MEMORY_KIB", argon2_defaults.memory_kib)?,
            iterations: parse_or(&lookup, "ARGON2_ITERATIONS", argon2_defaults.iterations)?,
            parallelism: parse_or(&lookup, "ARGON2_PARALLELISM", argon2_defaults.parallelism)?,
        };

        Ok(Self {
            environment: lookup("RUST_ENV").unwrap_or_else(|| "development".to_string()),
            database_url,
            pool,
            story_sweep_interval,
            argon2,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn secs_or<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, key, default.as_secs()).map(Duration::from_secs)
}
