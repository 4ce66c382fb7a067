//! 애플리케이션 공유 상태.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use etl_queue::MessagePublisher;

use crate::services::EtlPipeline;

/// 핸들러 간 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// ETL 파이프라인
    pub pipeline: Arc<EtlPipeline>,
    /// 큐 발행자
    pub publisher: Arc<dyn MessagePublisher>,
    /// 요청에 사용할 샘플링 간격
    pub interval: String,
    /// 서비스 버전
    pub version: String,
    /// 시작 시각
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<EtlPipeline>,
        publisher: Arc<dyn MessagePublisher>,
        interval: impl Into<String>,
    ) -> Self {
        Self {
            pipeline,
            publisher,
            interval: interval.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
