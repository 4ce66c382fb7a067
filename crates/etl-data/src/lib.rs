//! 데이터 추출, 다운로드 원장, CSV 내보내기.
//!
//! 이 crate는 다음을 제공합니다:
//! - Alpha Vantage 인트라데이 시계열 추출 클라이언트
//! - (심볼, 날짜, 간격) 단위 다운로드 원장과 키별 잠금
//! - 심볼/날짜별 CSV 파일 내보내기

pub mod export;
pub mod provider;
pub mod tracker;

pub use export::{CsvExporter, ExportOutcome, Exporter};
pub use provider::{AlphaVantageClient, StockDataSource};
pub use tracker::{DownloadTracker, JsonFileLedger, KeyGuard, LedgerStore, MemoryLedger};
