//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `POST /api/v1/etl/{symbol}` - 오늘(UTC) 데이터 동기 ETL
//! - `POST /api/v1/etl/queue/{symbol}` - 오늘(UTC) 데이터 ETL 요청을 큐에 발행

pub mod etl;
pub mod health;

pub use etl::{etl_router, EtlQueuedResponse, EtlRunResponse};
pub use health::{health_router, HealthResponse};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health_router())
        .nest("/api/v1/etl", etl_router())
}
