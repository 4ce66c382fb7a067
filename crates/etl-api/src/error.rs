//! API 에러 응답 타입.
//!
//! 모든 엔드포인트에서 일관된 에러 형식을 제공합니다.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use etl_core::{ErrorClass, EtlError, NoDataReason};

/// API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "Extract.NoTimeSeries",
///   "message": "Time series data not found in the API response: 'Time Series (15min)' missing",
///   "timestamp": 1746057600
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "Extract.InvalidInput", "Etl.NoData")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(code: impl Into<String>, message: impl Into<String>, details: Value) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 에러 분류에 대응하는 HTTP 상태 코드.
pub fn status_for(err: &EtlError) -> StatusCode {
    match err.class() {
        ErrorClass::Validation => StatusCode::BAD_REQUEST,
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::Failure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `EtlError`를 API 에러 응답으로 변환합니다.
///
/// 날짜 필터 결과가 비어 있으면 해당 날짜를 `details`에 담습니다.
pub fn etl_error_response(err: &EtlError) -> (StatusCode, Json<ApiErrorResponse>) {
    let body = match err {
        EtlError::NoData(NoDataReason::NotOnDate(date)) => ApiErrorResponse::with_details(
            err.code(),
            err.to_string(),
            json!({ "date": date.format("%Y-%m-%d").to_string() }),
        ),
        _ => ApiErrorResponse::new(err.code(), err.to_string()),
    };

    (status_for(err), Json(body))
}
