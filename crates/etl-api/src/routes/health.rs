//! 헬스 체크 endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 서비스 상태
    pub status: String,
    /// 서비스 버전
    pub version: String,
    /// 서버 업타임(초)
    pub uptime_secs: i64,
    /// 현재 시간 (ISO 8601)
    pub timestamp: String,
}

/// 헬스 체크 (liveness probe용).
///
/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: state.version.clone(),
            uptime_secs: state.uptime_secs(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }),
    )
}

/// 헬스 체크 라우터.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}
