use std::sync::Arc;
use std::time::Duration;

use animator_client::poller::DEFAULT_POLL_INTERVAL;
use animator_client::{JobApi, JobBackend, RemoteJobBackend, SimulatedJobBackend};
use animator_core::simulation::SimulationTimings;

/// Session configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the job API. `None` selects the simulated backend.
    pub api_url: Option<String>,
    /// Delay between status polls of a remote job (default: 2 s).
    pub poll_interval: Duration,
    /// Delays used by the simulated backend.
    pub simulation: SimulationTimings,
}

/// An environment variable was set to an unparseable value.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be a valid {expected}, got '{value}'")]
pub struct ConfigError {
    pub var: &'static str,
    pub expected: &'static str,
    pub value: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            simulation: SimulationTimings::default(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default            |
    /// |-----------------------------|--------------------|
    /// | `ANIMATOR_API_URL`          | unset (simulated)  |
    /// | `ANIMATOR_POLL_INTERVAL_MS` | `2000`             |
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("ANIMATOR_API_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let poll_interval_ms = match std::env::var("ANIMATOR_POLL_INTERVAL_MS") {
            Ok(value) => parse_millis("ANIMATOR_POLL_INTERVAL_MS", &value)?,
            Err(_) => DEFAULT_POLL_INTERVAL.as_millis() as u64,
        };

        Ok(Self {
            api_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
            ..Self::default()
        })
    }

    /// Build the processing backend this configuration selects.
    pub fn build_backend(&self) -> Arc<dyn JobBackend> {
        match &self.api_url {
            Some(url) => Arc::new(
                RemoteJobBackend::new(Arc::new(JobApi::new(url.as_str())))
                    .with_poll_interval(self.poll_interval),
            ),
            None => Arc::new(SimulatedJobBackend::new(self.simulation)),
        }
    }
}

fn parse_millis(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(ms),
        _ => Err(ConfigError {
            var,
            expected: "positive number of milliseconds",
            value: value.to_string(),
        }),
    }
}
