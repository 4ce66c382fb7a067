//! ETL 에러 타입.
//!
//! 추출/원장/내보내기/큐 전 구간에서 사용하는 에러 분류 체계를 정의합니다.
//! 각 에러는 안정적인 코드 문자열과 분류([`ErrorClass`])를 가지며,
//! 동기 API는 분류로 HTTP 상태를, 큐 소비자는 분류로 재시도 여부를 결정합니다.

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

/// 에러 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 잘못된 인자 (네트워크 호출 없음)
    Validation,
    /// 데이터 없음
    NotFound,
    /// 그 외 실패
    Failure,
}

/// 데이터가 비어 있는 단계.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDataReason {
    /// 제공자가 레코드를 하나도 반환하지 않음
    EmptyResponse,
    /// 요청 날짜로 필터링한 결과가 비어 있음
    NotOnDate(NaiveDate),
    /// 내보낼 레코드 없음
    NothingToExport,
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyResponse => write!(f, "No data returned from Alpha Vantage"),
            Self::NotOnDate(date) => {
                write!(f, "No intraday stock data available for {}", date)
            }
            Self::NothingToExport => write!(f, "No data to export"),
        }
    }
}

/// ETL 에러.
#[derive(Debug, Error)]
pub enum EtlError {
    /// 잘못된 입력
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 제공자 전송/상태 코드 실패
    #[error("Unable to fetch data from Alpha Vantage: {0}")]
    ProviderUnavailable(String),

    /// 응답 본문 파싱 실패
    #[error("Failed to parse API response: {0}")]
    ParsingFailed(String),

    /// 응답에 시계열 필드 없음
    #[error("Time series data not found in the API response: {0}")]
    NoTimeSeries(String),

    /// 레코드 없음
    #[error("{0}")]
    NoData(NoDataReason),

    /// 원장 읽기/쓰기 실패
    #[error("Download ledger error: {0}")]
    Ledger(String),

    /// CSV 내보내기 실패
    #[error("CSV export error: {0}")]
    Export(String),

    /// 큐 전송 실패
    #[error("Queue error: {0}")]
    Queue(String),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 직렬화 에러
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 파일 입출력 에러
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 예상하지 못한 에러
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// ETL 작업을 위한 Result 타입.
pub type Result<T> = std::result::Result<T, EtlError>;

impl EtlError {
    /// 안정적인 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "Extract.InvalidInput",
            Self::ProviderUnavailable(_) => "Extract.AlphaVantageUnavailable",
            Self::ParsingFailed(_) => "Extract.ParsingFailed",
            Self::NoTimeSeries(_) => "Extract.NoTimeSeries",
            Self::NoData(_) => "Etl.NoData",
            Self::Ledger(_) => "Etl.Ledger",
            Self::Export(_) => "Etl.Export",
            Self::Queue(_) => "Etl.Queue",
            Self::Config(_) => "Etl.Config",
            Self::Serialization(_) => "Etl.Serialization",
            Self::Io(_) => "Etl.Io",
            Self::Unexpected(_) => "Etl.Unexpected",
        }
    }

    /// 에러 분류.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidInput(_) => ErrorClass::Validation,
            Self::NoTimeSeries(_) | Self::NoData(_) => ErrorClass::NotFound,
            _ => ErrorClass::Failure,
        }
    }

    /// 추출 단계에서 발생한 에러인지 확인합니다.
    ///
    /// 큐 소비자는 이 에러들을 재시도하지 않고 dead-letter로 보냅니다.
    pub fn is_extraction_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::ProviderUnavailable(_)
                | Self::ParsingFailed(_)
                | Self::NoTimeSeries(_)
                | Self::NoData(NoDataReason::EmptyResponse)
        )
    }
}

impl From<serde_json::Error> for EtlError {
    fn from(err: serde_json::Error) -> Self {
        EtlError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for EtlError {
    fn from(err: config::ConfigError) -> Self {
        EtlError::Config(err.to_string())
    }
}
