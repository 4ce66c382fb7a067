//! HTTP 라우트 통합 테스트.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use common::{day_records, Fixture, StubSource};
use etl_api::{create_api_router, AppState};
use etl_core::{EtlError, EtlRequest, ExtractionResult};
use etl_queue::{MemoryQueue, MessagePublisher, MessageQueue, QueueError, QueuePublisher};

struct BrokenPublisher;

#[async_trait]
impl MessagePublisher for BrokenPublisher {
    async fn publish(&self, _request: &EtlRequest) -> etl_queue::Result<String> {
        Err(QueueError::Connection("connection refused".into()))
    }
}

fn app(fixture: &Fixture, publisher: Arc<dyn MessagePublisher>) -> Router {
    let state = Arc::new(AppState::new(fixture.pipeline.clone(), publisher, "15min"));
    create_api_router().with_state(state)
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_returns_ok() {
    let fixture = Fixture::new(StubSource::with_records(ExtractionResult::new()));
    let queue = Arc::new(MemoryQueue::new("etl-test"));
    let app = app(&fixture, Arc::new(QueuePublisher::new(queue)));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_run_etl_then_conflict() {
    let today = Utc::now().date_naive();
    let fixture = Fixture::new(StubSource::with_records(day_records(today, 2)));
    let queue = Arc::new(MemoryQueue::new("etl-test"));
    let app = app(&fixture, Arc::new(QueuePublisher::new(queue)));

    let response = app.clone().oneshot(post("/api/v1/etl/AAPL")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["message"], "ETL complete");
    assert_eq!(body["symbol"], "AAPL");
    assert_eq!(body["date"], today.format("%Y-%m-%d").to_string());
    assert!(body["filePath"].as_str().unwrap().ends_with(".csv"));

    let response = app.oneshot(post("/api/v1/etl/AAPL")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["code"], "Etl.AlreadyProcessed");
}

#[tokio::test]
async fn test_run_etl_without_data_is_not_found() {
    let fixture = Fixture::new(StubSource::with_records(ExtractionResult::new()));
    let queue = Arc::new(MemoryQueue::new("etl-test"));
    let app = app(&fixture, Arc::new(QueuePublisher::new(queue)));

    let response = app.oneshot(post("/api/v1/etl/AAPL")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["code"], "Etl.NoData");
    assert_eq!(body["message"], "No data returned from Alpha Vantage");
}

#[tokio::test]
async fn test_run_etl_without_data_for_today_reports_date() {
    let today = Utc::now().date_naive();
    let yesterday = today.pred_opt().unwrap();
    let fixture = Fixture::new(StubSource::with_records(day_records(yesterday, 4)));
    let queue = Arc::new(MemoryQueue::new("etl-test"));
    let app = app(&fixture, Arc::new(QueuePublisher::new(queue)));

    let response = app.oneshot(post("/api/v1/etl/AAPL")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["code"], "Etl.NoData");
    assert_eq!(body["details"]["date"], today.format("%Y-%m-%d").to_string());
}

#[tokio::test]
async fn test_run_etl_lowercase_symbol_writes_uppercase_path() {
    let today = Utc::now().date_naive();
    let fixture = Fixture::new(StubSource::with_records(day_records(today, 4)));
    let queue = Arc::new(MemoryQueue::new("etl-test"));
    let app = app(&fixture, Arc::new(QueuePublisher::new(queue)));

    let response = app.oneshot(post("/api/v1/etl/aapl")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let day = today.format("%Y-%m-%d").to_string();
    let expected = fixture
        .dir
        .path()
        .join("exports")
        .join("AAPL")
        .join(&day)
        .join(format!("AAPL_{}.csv", day));
    assert_eq!(body["filePath"], expected.display().to_string());
    assert!(expected.exists());
}

#[tokio::test]
async fn test_run_etl_provider_failure_is_server_error() {
    let fixture = Fixture::new(StubSource::failing(|| {
        EtlError::ProviderUnavailable("HTTP status 503".into())
    }));
    let queue = Arc::new(MemoryQueue::new("etl-test"));
    let app = app(&fixture, Arc::new(QueuePublisher::new(queue)));

    let response = app.oneshot(post("/api/v1/etl/AAPL")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await["code"],
        "Extract.AlphaVantageUnavailable"
    );
}

#[tokio::test]
async fn test_queue_etl_publishes_request() {
    let fixture = Fixture::new(StubSource::with_records(ExtractionResult::new()));
    let queue = Arc::new(MemoryQueue::new("etl-test"));
    let app = app(&fixture, Arc::new(QueuePublisher::new(queue.clone())));

    let response = app.oneshot(post("/api/v1/etl/queue/MSFT")).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response).await;
    assert_eq!(body["symbol"], "MSFT");
    assert_eq!(body["interval"], "15min");

    let message = queue
        .receive(Duration::from_millis(50))
        .await
        .unwrap()
        .unwrap();
    let request = EtlRequest::from_json(&message.body).unwrap();
    assert_eq!(request.symbol, "MSFT");
    assert_eq!(request.requested_date, Utc::now().date_naive());
    assert_eq!(fixture.source.calls(), 0);
}

#[tokio::test]
async fn test_queue_etl_publish_failure_is_server_error() {
    let fixture = Fixture::new(StubSource::with_records(ExtractionResult::new()));
    let app = app(&fixture, Arc::new(BrokenPublisher));

    let response = app.oneshot(post("/api/v1/etl/queue/AAPL")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["code"], "Etl.Queue");
}
