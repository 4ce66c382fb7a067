//! ETL 실행 endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use etl_core::EtlRequest;

use crate::error::{etl_error_response, ApiErrorResponse, ApiResult};
use crate::services::RunOutcome;
use crate::state::AppState;

/// 동기 ETL 완료 응답.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtlRunResponse {
    pub message: String,
    pub symbol: String,
    pub date: NaiveDate,
    pub file_path: String,
}

/// 큐 발행 응답.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtlQueuedResponse {
    pub message: String,
    pub symbol: String,
    pub interval: String,
    pub requested_date: NaiveDate,
}

/// 오늘(UTC) 데이터로 ETL을 실행합니다.
///
/// POST /api/v1/etl/{symbol}
pub async fn run_etl(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<EtlRunResponse>> {
    let today = Utc::now().date_naive();
    info!(symbol = %symbol, date = %today, "ETL started");

    match state
        .pipeline
        .run_for_date(&symbol, today, &state.interval)
        .await
    {
        Ok(RunOutcome::Exported {
            symbol,
            date,
            file_path,
        }) => Ok(Json(EtlRunResponse {
            message: "ETL complete".to_string(),
            symbol,
            date,
            file_path: file_path.display().to_string(),
        })),
        Ok(RunOutcome::AlreadyProcessed { symbol, date }) => Err((
            StatusCode::CONFLICT,
            Json(ApiErrorResponse::new(
                "Etl.AlreadyProcessed",
                format!("Data for {} on {} already processed.", symbol, date),
            )),
        )),
        Err(e) => {
            error!(symbol = %symbol, date = %today, code = e.code(), error = %e, "ETL failed");
            Err(etl_error_response(&e))
        }
    }
}

/// 오늘(UTC) 데이터에 대한 ETL 요청을 큐에 발행합니다.
///
/// POST /api/v1/etl/queue/{symbol}
pub async fn queue_etl(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<(StatusCode, Json<EtlQueuedResponse>)> {
    info!(symbol = %symbol, "ETL queue request received");

    let request = EtlRequest::for_today(symbol, state.interval.clone());

    if let Err(e) = state.publisher.publish(&request).await {
        error!(symbol = %request.symbol, error = %e, "ETL queue publish failed");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse::new(
                "Etl.Queue",
                format!("An error occurred while queuing the ETL request: {}", e),
            )),
        ));
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(EtlQueuedResponse {
            message: "ETL request queued successfully".to_string(),
            symbol: request.symbol,
            interval: request.interval,
            requested_date: request.requested_date,
        }),
    ))
}

/// ETL 라우터.
pub fn etl_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{symbol}", post(run_etl))
        .route("/queue/{symbol}", post(queue_etl))
}
