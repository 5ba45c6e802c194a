use animator_core::source_image::MAX_UPLOAD_BYTES;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted image upload in bytes (default: 10 MiB).
    pub max_upload_bytes: u64,
    /// Simulated time spent per generated frame (default: `100`).
    pub frame_delay_ms: u64,
}

/// An environment variable was set to an unparseable value.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be a valid {expected}, got '{value}'")]
pub struct ConfigError {
    pub var: &'static str,
    pub expected: &'static str,
    pub value: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                    |
    /// |-----------------------------|----------------------------|
    /// | `HOST`                      | `0.0.0.0`                  |
    /// | `PORT`                      | `5000`                     |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                       |
    /// | `MAX_UPLOAD_BYTES`          | `10485760`                 |
    /// | `GENERATION_FRAME_DELAY_MS` | `100`                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port: parse_var("PORT", "5000", "u16")?,
            cors_origins,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", "30", "u64")?,
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", &MAX_UPLOAD_BYTES.to_string(), "u64")?,
            frame_delay_ms: parse_var("GENERATION_FRAME_DELAY_MS", "100", "u64")?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    var: &'static str,
    default: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    let value = std::env::var(var).unwrap_or_else(|_| default.to_string());
    value.trim().parse().map_err(|_| ConfigError {
        var,
        expected,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_reports_variable_and_value() {
        let err = parse_var::<u16>("ANIMATOR_TEST_UNSET_VAR", "not-a-port", "u16").unwrap_err();
        assert_eq!(
            err.to_string(),
            "ANIMATOR_TEST_UNSET_VAR must be a valid u16, got 'not-a-port'"
        );
    }

    #[test]
    fn parse_var_uses_default() {
        let port: u16 = parse_var("ANIMATOR_TEST_UNSET_VAR", "5000", "u16").unwrap();
        assert_eq!(port, 5000);
    }
}
