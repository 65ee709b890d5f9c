use std::str::FromStr;
use std::time::Duration;

/// A configuration variable that is set but cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{var} has invalid value '{value}': expected {expected}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for a single-site install.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// SQLite database URL.
    pub database_url: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds. Event streams are exempt.
    pub request_timeout_secs: u64,
    /// Interval between keep-alive comments on event streams.
    pub sse_heartbeat_secs: u64,
    /// Per-subscriber event buffer.
    pub subscriber_buffer: usize,
    /// Restart queue numbering every UTC day.
    pub queue_reset_daily: bool,
    /// First sequence number of a period.
    pub queue_start_number: i64,
    /// Age after which open tickets are cancelled by the sweep; `0` disables.
    pub queue_auto_cancel_hours: i64,
    /// How long completed/failed print jobs are kept.
    pub print_job_retention_hours: i64,
    /// Sweep period in seconds.
    pub sweep_interval_secs: u64,
    /// Create print jobs for issued tickets.
    pub remote_print_enabled: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                  |
    /// |-----------------------------|--------------------------|
    /// | `HOST`                      | `0.0.0.0`                |
    /// | `PORT`                      | `8080`                   |
    /// | `DATABASE_URL`              | `sqlite://data/queue.db` |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                     |
    /// | `SSE_HEARTBEAT_SECS`        | `15`                     |
    /// | `SUBSCRIBER_BUFFER`         | `64`                     |
    /// | `QUEUE_RESET_DAILY`         | `true`                   |
    /// | `QUEUE_START_NUMBER`        | `1`                      |
    /// | `QUEUE_AUTO_CANCEL_HOURS`   | `24`                     |
    /// | `PRINT_JOB_RETENTION_HOURS` | `24`                     |
    /// | `SWEEP_INTERVAL_SECS`       | `3600`                   |
    /// | `REMOTE_PRINT_ENABLED`      | `true`                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/queue.db".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port: env_parse("PORT", 8080, "a port number")?,
            database_url,
            cors_origins,
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 30, "seconds")?,
            sse_heartbeat_secs: env_parse("SSE_HEARTBEAT_SECS", 15, "seconds")?,
            subscriber_buffer: env_parse("SUBSCRIBER_BUFFER", 64, "a buffer size")?,
            queue_reset_daily: env_bool("QUEUE_RESET_DAILY", true)?,
            queue_start_number: env_parse("QUEUE_START_NUMBER", 1, "an integer")?,
            queue_auto_cancel_hours: env_parse("QUEUE_AUTO_CANCEL_HOURS", 24, "hours")?,
            print_job_retention_hours: env_parse("PRINT_JOB_RETENTION_HOURS", 24, "hours")?,
            sweep_interval_secs: env_parse("SWEEP_INTERVAL_SECS", 3600, "seconds")?,
            remote_print_enabled: env_bool("REMOTE_PRINT_ENABLED", true)?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn sse_heartbeat(&self) -> Duration {
        Duration::from_secs(self.sse_heartbeat_secs.max(1))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            database_url: "sqlite://data/queue.db".into(),
            cors_origins: vec!["http://localhost:5173".into()],
            request_timeout_secs: 30,
            sse_heartbeat_secs: 15,
            subscriber_buffer: 64,
            queue_reset_daily: true,
            queue_start_number: 1,
            queue_auto_cancel_hours: 24,
            print_job_retention_hours: 24,
            sweep_interval_secs: 3600,
            remote_print_enabled: true,
        }
    }
}

fn env_parse<T: FromStr>(
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError {
            var,
            value,
            expected,
        }),
        Err(_) => Ok(default),
    }
}

fn env_bool(var: &'static str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(var) {
        Ok(value) => parse_bool(&value).ok_or(ConfigError {
            var,
            value,
            expected: "true or false",
        }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
