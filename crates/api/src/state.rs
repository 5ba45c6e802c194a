use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::jobs::generator::VideoGenerator;
use crate::jobs::registry::JobRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// In-memory job table.
    pub jobs: Arc<JobRegistry>,
    /// Produces artifacts for submitted jobs.
    pub generator: Arc<dyn VideoGenerator>,
    /// Cancelled on server shutdown; every job token is a child of it.
    pub shutdown: CancellationToken,
}
