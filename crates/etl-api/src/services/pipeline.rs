//! ETL 파이프라인.
//!
//! 동기 API, 큐 소비자, 백필 스케줄러가 공유하는 처리 순서:
//!
//! 1. (심볼, 날짜, 간격) 키 잠금
//! 2. 원장 확인 → 이미 처리되었으면 종료
//! 3. 추출 → 날짜 필터
//! 4. CSV 내보내기 → 원장 기록
//!
//! 키 잠금은 4단계가 끝날 때까지 유지됩니다.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use etl_core::{
    filter_by_date, DownloadKey, EtlError, ExtractionResult, NoDataReason, Result, StockRecord,
};
use etl_data::{DownloadTracker, ExportOutcome, Exporter, StockDataSource};

/// 단일 날짜 실행 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// CSV를 쓰고 원장에 기록함
    Exported {
        symbol: String,
        date: NaiveDate,
        file_path: PathBuf,
    },
    /// 원장에 이미 기록되어 있어 아무것도 하지 않음
    AlreadyProcessed { symbol: String, date: NaiveDate },
}

/// 미리 추출한 데이터로 하루를 처리한 결과 (백필용).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOutcome {
    /// 내보내기 완료
    Exported(PathBuf),
    /// 이미 처리된 날짜
    Skipped,
    /// 해당 날짜 레코드 없음
    Empty,
}

/// ETL 파이프라인.
#[derive(Clone)]
pub struct EtlPipeline {
    source: Arc<dyn StockDataSource>,
    tracker: DownloadTracker,
    exporter: Arc<dyn Exporter>,
}

impl EtlPipeline {
    pub fn new(
        source: Arc<dyn StockDataSource>,
        tracker: DownloadTracker,
        exporter: Arc<dyn Exporter>,
    ) -> Self {
        Self {
            source,
            tracker,
            exporter,
        }
    }

    /// 다운로드 추적기.
    pub fn tracker(&self) -> &DownloadTracker {
        &self.tracker
    }

    /// 데이터 소스에서 전체 시계열을 추출합니다.
    ///
    /// 빈 결과는 `NoData(EmptyResponse)` 에러가 됩니다.
    pub async fn extract(&self, symbol: &str, interval: &str) -> Result<ExtractionResult> {
        let data = self.source.extract(symbol, interval).await?;
        if data.is_empty() {
            return Err(EtlError::NoData(NoDataReason::EmptyResponse));
        }
        Ok(data)
    }

    /// 한 날짜에 대해 전체 파이프라인을 실행합니다.
    pub async fn run_for_date(
        &self,
        symbol: &str,
        date: NaiveDate,
        interval: &str,
    ) -> Result<RunOutcome> {
        let key = DownloadKey::new(symbol, date, interval);
        let _guard = self.tracker.lock(&key).await;

        if self
            .tracker
            .has_already_downloaded(symbol, date, interval)
            .await?
        {
            info!(symbol = %symbol, date = %date, "Already processed, skipping");
            return Ok(RunOutcome::AlreadyProcessed {
                symbol: symbol.to_string(),
                date,
            });
        }

        let data = self.extract(symbol, interval).await?;
        let records = filter_by_date(&data, date);
        if records.is_empty() {
            return Err(EtlError::NoData(NoDataReason::NotOnDate(date)));
        }

        let file_path = self.export_and_mark(&key, &records).await?;

        info!(symbol = %symbol, date = %date, "ETL complete");
        Ok(RunOutcome::Exported {
            symbol: symbol.to_string(),
            date,
            file_path,
        })
    }

    /// 미리 추출한 레코드로 한 날짜를 처리합니다.
    pub async fn export_day(
        &self,
        symbol: &str,
        date: NaiveDate,
        interval: &str,
        records: &[StockRecord],
    ) -> Result<DayOutcome> {
        let key = DownloadKey::new(symbol, date, interval);
        let _guard = self.tracker.lock(&key).await;

        if self
            .tracker
            .has_already_downloaded(symbol, date, interval)
            .await?
        {
            debug!(key = %key, "Day already processed");
            return Ok(DayOutcome::Skipped);
        }

        if records.is_empty() {
            debug!(key = %key, "No records for day");
            return Ok(DayOutcome::Empty);
        }

        let path = self.export_and_mark(&key, records).await?;
        Ok(DayOutcome::Exported(path))
    }

    /// 키 잠금을 보유한 상태에서 호출해야 합니다.
    async fn export_and_mark(&self, key: &DownloadKey, records: &[StockRecord]) -> Result<PathBuf> {
        let exporter = Arc::clone(&self.exporter);
        let records = records.to_vec();
        let (symbol, date) = (key.symbol.clone(), key.date);
        let saved = tokio::task::spawn_blocking(move || exporter.save(&records, &symbol, date))
            .await
            .map_err(|e| EtlError::Unexpected(format!("export task failed: {}", e)))?;

        let path = match saved? {
            ExportOutcome::Written(path) => path,
            ExportOutcome::NoData => return Err(EtlError::NoData(NoDataReason::NothingToExport)),
        };

        self.tracker
            .mark_as_downloaded(&key.symbol, key.date, &key.interval)
            .await?;

        Ok(path)
    }
}
