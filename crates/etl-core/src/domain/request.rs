//! 큐로 전달되는 ETL 작업 단위.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::dates::calendar_date;

/// 기본 샘플링 간격.
pub const DEFAULT_INTERVAL: &str = "15min";

fn default_interval() -> String {
    DEFAULT_INTERVAL.to_string()
}

/// 큐 메시지 페이로드.
///
/// 와이어 형식: `{"symbol": "AAPL", "interval": "15min", "requestedDate": "2025-05-01"}`.
/// 이전 발행자가 보낸 PascalCase 필드와 시각 포함 날짜도 수용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtlRequest {
    /// 종목 심볼
    #[serde(alias = "Symbol")]
    pub symbol: String,
    /// 샘플링 간격 (예: "15min")
    #[serde(alias = "Interval", default = "default_interval")]
    pub interval: String,
    /// 요청 시점의 UTC 달력 날짜
    #[serde(alias = "RequestedDate", with = "calendar_date")]
    pub requested_date: NaiveDate,
}

impl EtlRequest {
    /// 명시한 날짜로 요청을 생성합니다.
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            requested_date: date,
        }
    }

    /// 오늘(UTC) 날짜로 요청을 생성합니다.
    pub fn for_today(symbol: impl Into<String>, interval: impl Into<String>) -> Self {
        Self::new(symbol, interval, Utc::now().date_naive())
    }

    /// JSON 문자열로 직렬화합니다.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// JSON 문자열에서 역직렬화합니다.
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let request = EtlRequest::new("AAPL", "15min", NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
        let json = request.to_json().unwrap();

        assert_eq!(
            json,
            r#"{"symbol":"AAPL","interval":"15min","requestedDate":"2025-05-01"}"#
        );
        assert_eq!(EtlRequest::from_json(&json).unwrap(), request);
    }

    #[test]
    fn test_accepts_legacy_payload() {
        let body = r#"{"Symbol":"MSFT","Interval":"5min","RequestedDate":"2025-05-01T14:03:11.5120000Z"}"#;
        let request = EtlRequest::from_json(body).unwrap();

        assert_eq!(request.symbol, "MSFT");
        assert_eq!(request.interval, "5min");
        assert_eq!(
            request.requested_date,
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
        );
    }

    #[test]
    fn test_interval_defaults() {
        let request =
            EtlRequest::from_json(r#"{"symbol":"IBM","requestedDate":"2025-05-01"}"#).unwrap();
        assert_eq!(request.interval, DEFAULT_INTERVAL);
    }

    #[test]
    fn test_rejects_invalid_payload() {
        assert!(EtlRequest::from_json("null").is_err());
        assert!(EtlRequest::from_json("not json").is_err());
        assert!(EtlRequest::from_json(r#"{"symbol":"IBM","requestedDate":"soon"}"#).is_err());
    }
}
