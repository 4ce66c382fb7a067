//! 메시지 봉투와 전송 추상화.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 수신된 메시지.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessage {
    /// 메시지 ID (송신 시 발급)
    pub message_id: String,
    /// 본문 (EtlRequest JSON)
    pub body: String,
    /// 전달 횟수 (첫 전달 = 1)
    pub delivery_count: u32,
    /// 송신 시각
    pub enqueued_at: DateTime<Utc>,
    /// 이번 전달의 잠금 토큰 (처리 결과 보고에 사용)
    pub lock_token: String,
}

/// 메시지 처리 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// 처리 완료, 큐에서 제거
    Complete,
    /// 처리 실패, 재전달 대상으로 반환
    Abandon,
    /// 재시도하지 않고 dead-letter 큐로 이동
    DeadLetter { reason: String, description: String },
}

/// dead-letter 큐에 보관된 메시지.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub message: QueueMessage,
    pub reason: String,
    pub description: String,
    pub dead_lettered_at: DateTime<Utc>,
}

/// 메시지 큐 전송.
///
/// 수신한 메시지는 `complete`, `abandon`, `dead_letter` 중 하나로 정확히 한 번 처리해야 합니다.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// 큐 이름.
    fn name(&self) -> &str;

    /// 메시지를 송신하고 메시지 ID를 반환합니다.
    async fn send(&self, body: String) -> Result<String>;

    /// 최대 `timeout` 동안 메시지를 기다립니다.
    async fn receive(&self, timeout: Duration) -> Result<Option<QueueMessage>>;

    /// 처리 완료.
    async fn complete(&self, message: &QueueMessage) -> Result<()>;

    /// 재전달 대상으로 반환합니다. 다음 전달의 `delivery_count`가 1 증가합니다.
    async fn abandon(&self, message: &QueueMessage) -> Result<()>;

    /// dead-letter 큐로 이동합니다.
    async fn dead_letter(&self, message: &QueueMessage, reason: &str, description: &str)
        -> Result<()>;

    /// 처리 결과를 전송에 반영합니다.
    async fn settle(&self, message: &QueueMessage, disposition: &Disposition) -> Result<()> {
        match disposition {
            Disposition::Complete => self.complete(message).await,
            Disposition::Abandon => self.abandon(message).await,
            Disposition::DeadLetter {
                reason,
                description,
            } => self.dead_letter(message, reason, description).await,
        }
    }
}
