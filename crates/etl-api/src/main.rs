//! ETL 서비스 서버.
//!
//! REST API, 큐 소비자, 백필 스케줄러를 함께 실행합니다.

use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, Router};
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use etl_api::routes::create_api_router;
use etl_api::services::EtlPipeline;
use etl_api::state::AppState;
use etl_api::tasks::{start_backfill_scheduler, start_queue_consumer, QueueConsumerConfig};
use etl_core::{init_logging, AppConfig, LogConfig};
use etl_data::{AlphaVantageClient, CsvExporter, DownloadTracker, JsonFileLedger};
use etl_queue::QueuePublisher;

/// 백그라운드 태스크 종료 대기 한도.
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>) -> Router {
    create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 제공자 타임아웃보다 길어야 함
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(90),
        ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load()?;
    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    info!("Starting ETL service...");

    // 파이프라인 구성
    let ledger = Arc::new(JsonFileLedger::open(
        config.download_tracking.log_file_path.clone(),
    )?);
    let tracker = DownloadTracker::new(ledger);
    let source = Arc::new(AlphaVantageClient::new(&config.alpha_vantage)?);
    let exporter = Arc::new(CsvExporter::new(config.csv_export.export_path.clone()));
    let pipeline = Arc::new(EtlPipeline::new(source, tracker, exporter));

    // 큐 구성
    let queue = etl_queue::connect(&config.queue).await?;
    let publisher = Arc::new(QueuePublisher::new(Arc::clone(&queue)));

    let state = Arc::new(AppState::new(
        Arc::clone(&pipeline),
        publisher,
        config.alpha_vantage.interval.clone(),
    ));
    info!(
        version = %state.version,
        queue_backend = ?config.queue.backend,
        backfill_enabled = config.backfill.enabled,
        "Application state initialized"
    );

    // 전역 종료 토큰 (백그라운드 태스크에 전파)
    let shutdown_token = CancellationToken::new();

    let mut tasks = vec![start_queue_consumer(
        queue,
        Arc::clone(&pipeline),
        QueueConsumerConfig::from(&config.queue),
        shutdown_token.clone(),
    )];

    if config.backfill.enabled {
        tasks.push(start_backfill_scheduler(
            Arc::clone(&pipeline),
            config.backfill.clone(),
            shutdown_token.clone(),
        ));
    } else {
        info!("Backfill scheduler disabled");
    }

    let app = create_router(state);
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("Server shutdown initiated, waiting for background tasks...");
    shutdown_token.cancel();

    let drain = tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, async {
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Background task panicked");
            }
        }
    })
    .await;

    if drain.is_err() {
        warn!("Background tasks did not stop in time, forcing shutdown");
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}
