//! # ETL Core
//!
//! ETL 서비스 전반에서 공유되는 핵심 도메인 모델과 타입을 제공합니다.
//!
//! - 시계열 레코드 ([`StockRecord`]) 및 추출 결과
//! - 큐로 전달되는 작업 단위 ([`EtlRequest`])
//! - 멱등성 원장 키 ([`DownloadKey`])
//! - 에러 분류 체계 ([`EtlError`])
//! - 설정 관리 및 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use self::config::*;
pub use self::domain::*;
pub use self::error::*;
pub use self::logging::{init_logging, LogConfig, LogFormat};
