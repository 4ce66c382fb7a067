//! 통합 테스트 공용 픽스처.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tempfile::TempDir;

use etl_api::services::EtlPipeline;
use etl_core::{EtlError, ExtractionResult, Result, StockRecord};
use etl_data::{
    CsvExporter, DownloadTracker, ExportOutcome, Exporter, MemoryLedger, StockDataSource,
};

type ErrorFactory = Box<dyn Fn() -> EtlError + Send + Sync>;

/// 고정 응답을 돌려주는 데이터 소스.
pub struct StubSource {
    records: ExtractionResult,
    error: Option<ErrorFactory>,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn with_records(records: ExtractionResult) -> Self {
        Self {
            records,
            error: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: impl Fn() -> EtlError + Send + Sync + 'static) -> Self {
        Self {
            records: ExtractionResult::new(),
            error: Some(Box::new(error)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StockDataSource for StubSource {
    fn name(&self) -> &str {
        "Stub"
    }

    async fn extract(&self, _symbol: &str, _interval: &str) -> Result<ExtractionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // 동시 호출 테스트에서 경쟁 구간을 넓힘
        tokio::task::yield_now().await;

        match &self.error {
            Some(make_error) => Err(make_error()),
            None => Ok(self.records.clone()),
        }
    }
}

/// 지정한 날짜에 대해서만 실패하는 내보내기.
pub struct FlakyExporter {
    inner: CsvExporter,
    failing_dates: HashSet<NaiveDate>,
}

impl FlakyExporter {
    pub fn new(inner: CsvExporter, failing_dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            inner,
            failing_dates: failing_dates.into_iter().collect(),
        }
    }
}

impl Exporter for FlakyExporter {
    fn save(&self, records: &[StockRecord], symbol: &str, date: NaiveDate) -> Result<ExportOutcome> {
        if self.failing_dates.contains(&date) {
            return Err(EtlError::Export("disk full".into()));
        }
        self.inner.save(records, symbol, date)
    }
}

/// 하루치 15분 봉 레코드.
pub fn day_records(date: NaiveDate, count: usize) -> ExtractionResult {
    let start = date.and_hms_opt(9, 30, 0).unwrap();
    (0..count)
        .map(|i| {
            let timestamp = start + Duration::minutes(15 * i as i64);
            (
                timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                StockRecord::new(timestamp, "213.3200", "213.4000", "213.2000", "213.3500", "1520"),
            )
        })
        .collect()
}

/// 여러 날짜의 레코드를 합칩니다.
pub fn records_for(dates: &[NaiveDate], per_day: usize) -> ExtractionResult {
    dates
        .iter()
        .flat_map(|date| day_records(*date, per_day))
        .collect()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 임시 디렉토리 위의 파이프라인.
pub struct Fixture {
    pub dir: TempDir,
    pub source: Arc<StubSource>,
    pub tracker: DownloadTracker,
    pub pipeline: Arc<EtlPipeline>,
}

impl Fixture {
    pub fn new(source: StubSource) -> Self {
        let dir = TempDir::new().unwrap();
        let exporter = CsvExporter::new(dir.path().join("exports"));
        Self::build(dir, source, Arc::new(exporter))
    }

    pub fn with_failing_dates(source: StubSource, failing: &[NaiveDate]) -> Self {
        let dir = TempDir::new().unwrap();
        let exporter = FlakyExporter::new(
            CsvExporter::new(dir.path().join("exports")),
            failing.iter().copied(),
        );
        Self::build(dir, source, Arc::new(exporter))
    }

    fn build(dir: TempDir, source: StubSource, exporter: Arc<dyn Exporter>) -> Self {
        let source = Arc::new(source);
        let tracker = DownloadTracker::new(Arc::new(MemoryLedger::new()));
        let pipeline = Arc::new(EtlPipeline::new(
            source.clone(),
            tracker.clone(),
            exporter,
        ));

        Self {
            dir,
            source,
            tracker,
            pipeline,
        }
    }

    pub fn csv_path(&self, symbol: &str, date: NaiveDate) -> std::path::PathBuf {
        CsvExporter::new(self.dir.path().join("exports")).path_for(symbol, date)
    }
}
