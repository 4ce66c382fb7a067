//! 달력 날짜 파싱 및 직렬화.
//!
//! 원장과 큐 메시지는 날짜를 `YYYY-MM-DD`로 기록하지만, 이전 형식의
//! 타임스탬프(`2025-05-01T00:00:00`, `2025-05-01T13:45:10.1234567Z`)도 읽을 수
//! 있어야 합니다. 시간 성분이 있으면 UTC 기준 날짜만 사용합니다.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// 문자열을 달력 날짜로 파싱합니다.
///
/// 지원 형식:
/// - `YYYY-MM-DD`
/// - RFC 3339 (`2025-05-01T13:45:10Z`, `2025-05-01T13:45:10+09:00`)
/// - 오프셋 없는 날짜/시각 (`2025-05-01T13:45:10`, `2025-05-01 13:45:10.123`)
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

/// serde `with` 모듈: `YYYY-MM-DD`로 쓰고, [`parse_calendar_date`] 형식으로 읽습니다.
pub mod calendar_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_calendar_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid calendar date: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(
            parse_calendar_date("2025-05-01"),
            NaiveDate::from_ymd_opt(2025, 5, 1)
        );
    }

    #[test]
    fn test_parse_legacy_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2025, 5, 1);
        assert_eq!(parse_calendar_date("2025-05-01T00:00:00"), expected);
        assert_eq!(parse_calendar_date("2025-05-01T13:45:10.1234567Z"), expected);
        assert_eq!(parse_calendar_date("2025-05-01 09:30:00"), expected);
    }

    #[test]
    fn test_rfc3339_offset_is_normalized_to_utc() {
        // 한국 시간 오전 8시는 UTC 기준 전날
        assert_eq!(
            parse_calendar_date("2025-05-02T08:00:00+09:00"),
            NaiveDate::from_ymd_opt(2025, 5, 1)
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_calendar_date(""), None);
        assert_eq!(parse_calendar_date("yesterday"), None);
        assert_eq!(parse_calendar_date("2025-13-01"), None);
    }
}
