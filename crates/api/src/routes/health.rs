use animator_client::messages::HealthResponse;
use axum::extract::State;
use axum::{routing::get, Json, Router};

use crate::state::AppState;

/// GET /api/health -- reports generator readiness.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let generator = &state.generator;

    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: generator.model_loaded(),
        device: Some(generator.device().to_string()),
        gpu_info: Some(serde_json::Value::String(generator.gpu_info())),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
