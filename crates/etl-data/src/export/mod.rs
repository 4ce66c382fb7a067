//! 레코드 내보내기.

mod csv_file;

use std::path::PathBuf;

use chrono::NaiveDate;

use etl_core::{Result, StockRecord};

pub use csv_file::CsvExporter;

/// 내보내기 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// 파일을 썼음
    Written(PathBuf),
    /// 레코드가 없어 아무것도 쓰지 않음
    NoData,
}

impl ExportOutcome {
    /// 쓴 파일 경로.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Written(path) => Some(path),
            Self::NoData => None,
        }
    }
}

/// 심볼/날짜 단위 레코드 내보내기.
///
/// 구현은 동기 I/O를 수행하므로 비동기 컨텍스트에서는 `spawn_blocking`으로 호출합니다.
pub trait Exporter: Send + Sync {
    /// 레코드를 저장합니다. 같은 (심볼, 날짜)는 같은 위치에 덮어씁니다.
    fn save(&self, records: &[StockRecord], symbol: &str, date: NaiveDate)
        -> Result<ExportOutcome>;
}
