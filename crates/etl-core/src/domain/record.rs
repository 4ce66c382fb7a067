//! 시계열 레코드 타입.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// CSV 출력에 사용하는 타임스탬프 형식.
pub const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 하나의 샘플링 구간 (인트라데이 봉).
///
/// 가격과 거래량은 제공자 응답의 문자열을 그대로 보존합니다 (반올림/재포맷 없음).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// 제공자 현지 시각
    pub timestamp: NaiveDateTime,
    /// 시가
    pub open: String,
    /// 고가
    pub high: String,
    /// 저가
    pub low: String,
    /// 종가
    pub close: String,
    /// 거래량
    pub volume: String,
}

impl StockRecord {
    /// 새 레코드를 생성합니다.
    pub fn new(
        timestamp: NaiveDateTime,
        open: impl Into<String>,
        high: impl Into<String>,
        low: impl Into<String>,
        close: impl Into<String>,
        volume: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            open: open.into(),
            high: high.into(),
            low: low.into(),
            close: close.into(),
            volume: volume.into(),
        }
    }

    /// 레코드가 속한 달력 날짜.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// `YYYY-MM-DD HH:MM:SS` 형식의 타임스탬프.
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(CSV_TIMESTAMP_FORMAT).to_string()
    }
}

/// 추출 결과: 타임스탬프 문자열 → 레코드.
///
/// 키는 제공자 응답의 원본 키이며 정렬된 상태로 유지됩니다.
pub type ExtractionResult = BTreeMap<String, StockRecord>;

/// 제공자 타임스탬프 키를 파싱합니다.
///
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD`(자정)을 지원합니다.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// 특정 날짜의 레코드만 시간순으로 반환합니다.
pub fn filter_by_date(records: &ExtractionResult, date: NaiveDate) -> Vec<StockRecord> {
    let mut filtered: Vec<StockRecord> = records
        .values()
        .filter(|r| r.date() == date)
        .cloned()
        .collect();
    filtered.sort_by_key(|r| r.timestamp);
    filtered
}

/// 레코드를 날짜별로 그룹핑합니다 (각 그룹은 시간순).
pub fn group_by_date(records: &ExtractionResult) -> BTreeMap<NaiveDate, Vec<StockRecord>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<StockRecord>> = BTreeMap::new();
    for record in records.values() {
        grouped.entry(record.date()).or_default().push(record.clone());
    }
    for day in grouped.values_mut() {
        day.sort_by_key(|r| r.timestamp);
    }
    grouped
}
