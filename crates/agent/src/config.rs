use std::path::PathBuf;
use std::time::Duration;

/// Configuration that is missing or cannot be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Print agent configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the queue server, without trailing slash.
    pub server_url: String,
    /// Identifier sent with claims and on the event stream.
    pub agent_id: String,
    /// Display name of the printer, used in logs.
    pub printer_name: String,
    /// Raw printer device (e.g. `/dev/usb/lp0`). `None` prints to the log.
    pub printer_device: Option<PathBuf>,
    /// Wait between a lost stream and the next catch-up.
    pub retry_delay: Duration,
    /// Timeout for claim/complete/fail and the pending list.
    pub request_timeout: Duration,
}

impl AgentConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable               | Required | Default     |
    /// |------------------------|----------|-------------|
    /// | `SERVER_URL`           | yes      | --          |
    /// | `AGENT_ID`             | no       | `printer-1` |
    /// | `PRINTER_NAME`         | no       | `ECO80`     |
    /// | `PRINTER_DEVICE`       | no       | dry run     |
    /// | `RETRY_DELAY_SECS`     | no       | `5`         |
    /// | `REQUEST_TIMEOUT_SECS` | no       | `30`        |
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_url = std::env::var("SERVER_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("SERVER_URL"))?;

        let agent_id = std::env::var("AGENT_ID").unwrap_or_else(|_| "printer-1".into());
        let printer_name = std::env::var("PRINTER_NAME").unwrap_or_else(|_| "ECO80".into());
        let printer_device = std::env::var("PRINTER_DEVICE")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            server_url,
            agent_id,
            printer_name,
            printer_device,
            retry_delay: Duration::from_secs(secs("RETRY_DELAY_SECS", 5)?),
            request_timeout: Duration::from_secs(secs("REQUEST_TIMEOUT_SECS", 30)?),
        })
    }
}

fn secs(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            value,
            expected: "a whole number of seconds",
        }),
        Err(_) => Ok(default),
    }
}
