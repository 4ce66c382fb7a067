//! 큐 소비자.
//!
//! 메시지 하나를 끝까지 처리(정산 포함)한 뒤 다음 메시지를 받습니다.
//!
//! | 상황 | 결과 |
//! |------|------|
//! | 페이로드 파싱 실패 | dead-letter `Invalid ETLRequest payload` |
//! | 이미 처리됨 | complete |
//! | 추출 실패 / 빈 응답 | dead-letter `No data found or extraction failed` |
//! | 날짜 필터 결과 없음 | dead-letter `Filtered data empty` |
//! | 성공 | complete |
//! | 그 외 실패, 전달 횟수 < 최대 | abandon (재전달) |
//! | 그 외 실패, 전달 횟수 >= 최대 | dead-letter `Max retry exceeded` |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use etl_core::{EtlError, EtlRequest, NoDataReason, QueueConfig};
use etl_queue::{Disposition, MessageQueue, QueueError, QueueMessage};

use crate::services::{EtlPipeline, RunOutcome};

/// 소비자 설정.
#[derive(Debug, Clone)]
pub struct QueueConsumerConfig {
    /// 수신 대기 타임아웃 (종료 시그널 확인 주기)
    pub poll_timeout: Duration,
    /// dead-letter 전 최대 전달 횟수
    pub max_retries: u32,
}

impl Default for QueueConsumerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }
}

impl From<&QueueConfig> for QueueConsumerConfig {
    fn from(config: &QueueConfig) -> Self {
        Self {
            poll_timeout: config.poll_timeout(),
            max_retries: config.max_retries,
        }
    }
}

/// 정상 완료 종류.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Exported { path: PathBuf },
    AlreadyProcessed,
}

/// dead-letter 사유.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadLetterReason {
    InvalidPayload(String),
    ExtractionFailed(String),
    FilteredDataEmpty,
    MaxRetriesExceeded { detail: String },
}

impl DeadLetterReason {
    /// 전송에 기록되는 사유 문자열.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "Invalid ETLRequest payload",
            Self::ExtractionFailed(_) => "No data found or extraction failed",
            Self::FilteredDataEmpty => "Filtered data empty",
            Self::MaxRetriesExceeded { .. } => "Max retry exceeded",
        }
    }

    /// 상세 설명.
    pub fn description(&self) -> String {
        match self {
            Self::InvalidPayload(detail)
            | Self::ExtractionFailed(detail)
            | Self::MaxRetriesExceeded { detail } => detail.clone(),
            Self::FilteredDataEmpty => String::new(),
        }
    }
}

/// 메시지 처리 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Completed(Completion),
    DeadLettered(DeadLetterReason),
    Abandoned { error: String },
}

impl MessageOutcome {
    /// 전송에 반영할 처리 결과.
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::Completed(_) => Disposition::Complete,
            Self::Abandoned { .. } => Disposition::Abandon,
            Self::DeadLettered(reason) => Disposition::DeadLetter {
                reason: reason.reason().to_string(),
                description: reason.description(),
            },
        }
    }
}

/// 메시지 하나를 처리하고 결과를 결정합니다. 전송에는 아무것도 보고하지 않습니다.
pub async fn process_message(
    pipeline: &EtlPipeline,
    message: &QueueMessage,
    max_retries: u32,
) -> MessageOutcome {
    let request = match EtlRequest::from_json(&message.body) {
        Ok(request) => request,
        Err(e) => {
            warn!(message_id = %message.message_id, error = %e, "Received invalid ETL request message");
            return MessageOutcome::DeadLettered(DeadLetterReason::InvalidPayload(e.to_string()));
        }
    };

    let symbol = request.symbol.as_str();
    let date = request.requested_date;

    match pipeline
        .run_for_date(symbol, date, &request.interval)
        .await
    {
        Ok(RunOutcome::Exported { file_path, .. }) => {
            MessageOutcome::Completed(Completion::Exported { path: file_path })
        }
        Ok(RunOutcome::AlreadyProcessed { .. }) => {
            info!(symbol = %symbol, date = %date, "Skipping duplicate ETL request");
            MessageOutcome::Completed(Completion::AlreadyProcessed)
        }
        Err(e) if e.is_extraction_error() => {
            warn!(symbol = %symbol, date = %date, error = %e, "No data found or extraction failed");
            MessageOutcome::DeadLettered(DeadLetterReason::ExtractionFailed(e.to_string()))
        }
        Err(EtlError::NoData(NoDataReason::NotOnDate(_))) => {
            warn!(symbol = %symbol, date = %date, "No intraday data found for requested date");
            MessageOutcome::DeadLettered(DeadLetterReason::FilteredDataEmpty)
        }
        Err(e) => {
            error!(
                symbol = %symbol,
                date = %date,
                delivery_count = message.delivery_count,
                error = %e,
                "Failed to process ETL message"
            );
            if message.delivery_count >= max_retries {
                warn!(message_id = %message.message_id, "Max retry limit reached, moving message to dead-letter queue");
                MessageOutcome::DeadLettered(DeadLetterReason::MaxRetriesExceeded {
                    detail: e.to_string(),
                })
            } else {
                info!(
                    message_id = %message.message_id,
                    delivery_count = message.delivery_count,
                    "Retrying message"
                );
                MessageOutcome::Abandoned {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// 메시지를 처리하고 결과를 전송에 반영합니다.
pub async fn handle_message(
    queue: &dyn MessageQueue,
    pipeline: &EtlPipeline,
    message: &QueueMessage,
    max_retries: u32,
) -> Result<MessageOutcome, QueueError> {
    let outcome = process_message(pipeline, message, max_retries).await;
    queue.settle(message, &outcome.disposition()).await?;

    debug!(message_id = %message.message_id, outcome = ?outcome, "Message settled");
    Ok(outcome)
}

/// 큐 소비자 시작.
///
/// 종료 토큰이 취소되면 처리 중인 메시지를 정산한 뒤 종료합니다.
pub fn start_queue_consumer(
    queue: Arc<dyn MessageQueue>,
    pipeline: Arc<EtlPipeline>,
    config: QueueConsumerConfig,
    shutdown_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            queue = %queue.name(),
            max_retries = config.max_retries,
            poll_timeout_secs = config.poll_timeout.as_secs(),
            "큐 소비자 시작"
        );

        loop {
            let received = tokio::select! {
                _ = shutdown_token.cancelled() => {
                    info!("큐 소비자: 종료 시그널 수신");
                    break;
                }
                received = queue.receive(config.poll_timeout) => received,
            };

            let message = match received {
                Ok(Some(message)) => message,
                Ok(None) => continue,
                Err(e) => {
                    error!(error = %e, "큐 수신 실패");
                    tokio::select! {
                        _ = tokio::time::sleep(config.poll_timeout) => continue,
                        _ = shutdown_token.cancelled() => break,
                    }
                }
            };

            if let Err(e) =
                handle_message(queue.as_ref(), &pipeline, &message, config.max_retries).await
            {
                error!(message_id = %message.message_id, error = %e, "메시지 정산 실패");
            }
        }

        info!("큐 소비자 종료됨");
    })
}
