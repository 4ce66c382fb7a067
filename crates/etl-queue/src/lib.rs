//! ETL 요청 큐.
//!
//! 이 crate는 다음을 제공합니다:
//! - 전송 추상화 ([`MessageQueue`]): 송신, 수신, 완료/포기/dead-letter 처리
//! - 프로세스 내 큐 ([`MemoryQueue`])
//! - Redis 리스트 기반 신뢰성 큐 ([`RedisQueue`])
//! - [`EtlRequest`](etl_core::EtlRequest) 발행자 ([`QueuePublisher`])

pub mod error;
pub mod memory;
pub mod message;
pub mod publisher;
pub mod redis;

use std::sync::Arc;

use etl_core::{QueueBackend, QueueConfig};
use tracing::info;

pub use error::{QueueError, Result};
pub use memory::MemoryQueue;
pub use message::{DeadLetter, Disposition, MessageQueue, QueueMessage};
pub use publisher::{MessagePublisher, QueuePublisher};
pub use self::redis::RedisQueue;

/// 설정된 백엔드로 큐를 생성합니다.
pub async fn connect(config: &QueueConfig) -> Result<Arc<dyn MessageQueue>> {
    match config.backend {
        QueueBackend::Memory => {
            info!(queue = %config.queue_name, "Using in-memory queue");
            Ok(Arc::new(MemoryQueue::new(&config.queue_name)))
        }
        QueueBackend::Redis => {
            let queue = RedisQueue::connect(&config.redis_url, &config.queue_name).await?;
            queue.requeue_in_flight().await?;
            Ok(Arc::new(queue))
        }
    }
}
