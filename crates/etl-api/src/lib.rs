//! ETL 서비스.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 추출 → 필터 → CSV 내보내기 → 원장 기록 파이프라인
//! - 큐 소비자 (단일 in-flight 메시지)
//! - 최근 N일 백필 스케줄러
//! - Axum 기반 REST API
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`services`]: ETL 파이프라인
//! - [`tasks`]: 백그라운드 태스크 (큐 소비자, 백필)
//! - [`routes`]: REST API 엔드포인트
//! - [`error`]: API 에러 응답

pub mod error;
pub mod routes;
pub mod services;
pub mod state;
pub mod tasks;

pub use error::{ApiErrorResponse, ApiResult};
pub use routes::create_api_router;
pub use services::{EtlPipeline, RunOutcome};
pub use state::AppState;
