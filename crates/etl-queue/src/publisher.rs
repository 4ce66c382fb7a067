//! ETL 요청 발행.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use etl_core::EtlRequest;

use crate::error::Result;
use crate::message::MessageQueue;

/// ETL 요청 발행자.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// 요청을 큐에 발행하고 메시지 ID를 반환합니다.
    async fn publish(&self, request: &EtlRequest) -> Result<String>;
}

/// 큐 전송 위에서 동작하는 발행자.
#[derive(Clone)]
pub struct QueuePublisher {
    queue: Arc<dyn MessageQueue>,
}

impl QueuePublisher {
    pub fn new(queue: Arc<dyn MessageQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl MessagePublisher for QueuePublisher {
    async fn publish(&self, request: &EtlRequest) -> Result<String> {
        let body = request.to_json()?;
        let message_id = self.queue.send(body).await?;

        info!(
            queue = %self.queue.name(),
            message_id = %message_id,
            symbol = %request.symbol,
            interval = %request.interval,
            requested_date = %request.requested_date,
            "Published ETL request"
        );

        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryQueue;
    use chrono::NaiveDate;
    use std::time::Duration;

    #[tokio::test]
    async fn test_publish_writes_wire_payload() {
        let queue = Arc::new(MemoryQueue::new("etl-test"));
        let publisher = QueuePublisher::new(queue.clone());
        let request = EtlRequest::new("AAPL", "15min", NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());

        let message_id = publisher.publish(&request).await.unwrap();
        let message = queue
            .receive(Duration::from_millis(50))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(message.message_id, message_id);
        assert_eq!(
            message.body,
            r#"{"symbol":"AAPL","interval":"15min","requestedDate":"2025-05-01"}"#
        );
        assert_eq!(EtlRequest::from_json(&message.body).unwrap(), request);
    }
}
