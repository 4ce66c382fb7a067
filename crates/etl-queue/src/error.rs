//! 큐 오류 타입.

use etl_core::EtlError;
use thiserror::Error;

/// 큐 관련 오류.
#[derive(Debug, Error)]
pub enum QueueError {
    /// 연결 오류
    #[error("Connection error: {0}")]
    Connection(String),

    /// Redis 명령 오류
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 잠금 토큰이 유효하지 않음 (이미 처리되었거나 알 수 없는 메시지)
    #[error("Message lock lost: {0}")]
    LockLost(String),
}

/// 큐 작업을 위한 Result 타입.
pub type Result<T> = std::result::Result<T, QueueError>;

impl From<QueueError> for EtlError {
    fn from(err: QueueError) -> Self {
        EtlError::Queue(err.to_string())
    }
}
