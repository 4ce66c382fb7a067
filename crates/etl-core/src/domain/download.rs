//! 다운로드 원장 키.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::calendar_date;

/// (심볼, 날짜, 간격) 멱등성 키.
///
/// 원장 파일에는 `{"symbol", "date", "interval"}` 객체로 기록됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DownloadKey {
    #[serde(alias = "Symbol")]
    pub symbol: String,
    #[serde(alias = "Date", with = "calendar_date")]
    pub date: NaiveDate,
    #[serde(alias = "Interval")]
    pub interval: String,
}

/// 원장에 영속화되는 항목.
pub type DownloadLogEntry = DownloadKey;

impl DownloadKey {
    pub fn new(symbol: impl Into<String>, date: NaiveDate, interval: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            interval: interval.into(),
        }
    }
}

impl fmt::Display for DownloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}/{}", self.symbol, self.date, self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_legacy_entry() {
        let json = r#"{"Symbol":"AAPL","Date":"2025-05-01T00:00:00","Interval":"15min"}"#;
        let key: DownloadKey = serde_json::from_str(json).unwrap();

        assert_eq!(
            key,
            DownloadKey::new("AAPL", NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(), "15min")
        );
        assert_eq!(
            serde_json::to_string(&key).unwrap(),
            r#"{"symbol":"AAPL","date":"2025-05-01","interval":"15min"}"#
        );
    }

    #[test]
    fn test_symbol_is_case_sensitive() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        assert_ne!(
            DownloadKey::new("aapl", date, "15min"),
            DownloadKey::new("AAPL", date, "15min")
        );
    }
}
