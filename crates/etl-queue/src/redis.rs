//! Redis 리스트 기반 신뢰성 큐.
//!
//! 키 구성 (`{queue}` = 큐 이름):
//! - `{queue}:pending`: 대기 메시지 (LPUSH 송신, 오른쪽에서 수신)
//! - `{queue}:processing`: 수신되어 처리 중인 메시지 (`BLMOVE`로 원자적 이동)
//! - `{queue}:dlq`: dead-letter 메시지 (봉투 + 사유)
//!
//! 소비자가 정산 전에 종료되면 메시지는 processing 리스트에 남고,
//! 다음 시작 시 [`RedisQueue::requeue_in_flight`]로 복구됩니다.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{QueueError, Result};
use crate::message::{DeadLetter, MessageQueue, QueueMessage};

/// 리스트에 저장되는 봉투.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    message_id: String,
    body: String,
    /// 지금까지의 전달 횟수
    deliveries: u32,
    enqueued_at: DateTime<Utc>,
}

/// Redis 큐.
pub struct RedisQueue {
    name: String,
    pending_key: String,
    processing_key: String,
    dlq_key: String,
    conn: ConnectionManager,
    /// `BLMOVE` 전용 연결 (블로킹 명령이 다른 명령을 지연시키지 않도록 분리)
    blocking: AsyncMutex<ConnectionManager>,
    /// 잠금 토큰 → processing 리스트에 있는 원본 문자열
    in_flight: Mutex<HashMap<String, String>>,
}

impl RedisQueue {
    /// Redis에 연결합니다.
    pub async fn connect(url: &str, name: &str) -> Result<Self> {
        info!(queue = %name, "Connecting to Redis queue...");

        let client = Client::open(url).map_err(|e| QueueError::Connection(e.to_string()))?;
        let conn = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;
        let blocking = ConnectionManager::new(client)
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;

        info!(queue = %name, "Redis queue connection established");

        Ok(Self {
            name: name.to_string(),
            pending_key: format!("{}:pending", name),
            processing_key: format!("{}:processing", name),
            dlq_key: format!("{}:dlq", name),
            conn,
            blocking: AsyncMutex::new(blocking),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    /// 이전 실행에서 정산되지 않은 메시지를 대기 리스트로 되돌립니다.
    ///
    /// 소비자가 시작되기 전에 호출해야 합니다.
    pub async fn requeue_in_flight(&self) -> Result<usize> {
        let mut conn = self.conn.clone();
        let mut moved = 0usize;

        loop {
            let raw: Option<String> = redis::cmd("LMOVE")
                .arg(&self.processing_key)
                .arg(&self.pending_key)
                .arg("LEFT")
                .arg("RIGHT")
                .query_async(&mut conn)
                .await?;
            if raw.is_none() {
                break;
            }
            moved += 1;
        }

        if moved > 0 {
            warn!(queue = %self.name, moved, "Requeued unsettled messages");
        }
        Ok(moved)
    }

    /// dead-letter 리스트 길이.
    pub async fn dead_letter_len(&self) -> Result<usize> {
        let mut conn = self.conn.clone();
        let len: usize = conn.llen(&self.dlq_key).await?;
        Ok(len)
    }

    fn take_raw(&self, message: &QueueMessage) -> Result<String> {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&message.lock_token)
            .ok_or_else(|| QueueError::LockLost(message.message_id.clone()))
    }

    fn track_raw(&self, message: &QueueMessage, raw: String) {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(message.lock_token.clone(), raw);
    }
}

#[async_trait]
impl MessageQueue for RedisQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, body: String) -> Result<String> {
        let envelope = Envelope {
            message_id: Uuid::new_v4().to_string(),
            body,
            deliveries: 0,
            enqueued_at: Utc::now(),
        };
        let raw = serde_json::to_string(&envelope)?;

        let mut conn = self.conn.clone();
        let _: i64 = conn.lpush(&self.pending_key, raw).await?;

        debug!(queue = %self.name, message_id = %envelope.message_id, "Message enqueued");
        Ok(envelope.message_id)
    }

    async fn receive(&self, timeout: Duration) -> Result<Option<QueueMessage>> {
        let raw: Option<String> = {
            let mut conn = self.blocking.lock().await;
            if timeout.is_zero() {
                redis::cmd("LMOVE")
                    .arg(&self.pending_key)
                    .arg(&self.processing_key)
                    .arg("RIGHT")
                    .arg("LEFT")
                    .query_async(&mut *conn)
                    .await?
            } else {
                redis::cmd("BLMOVE")
                    .arg(&self.pending_key)
                    .arg(&self.processing_key)
                    .arg("RIGHT")
                    .arg("LEFT")
                    .arg(timeout.as_secs_f64())
                    .query_async(&mut *conn)
                    .await?
            }
        };

        let Some(raw) = raw else {
            return Ok(None);
        };

        let envelope: Envelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                // 봉투 자체가 깨진 항목은 소비자에게 넘기지 않고 바로 격리
                warn!(queue = %self.name, error = %e, "Dropping malformed envelope to dead-letter list");
                let mut conn = self.conn.clone();
                let _: () = redis::pipe()
                    .atomic()
                    .lrem(&self.processing_key, 1, &raw)
                    .ignore()
                    .lpush(&self.dlq_key, &raw)
                    .ignore()
                    .query_async(&mut conn)
                    .await?;
                return Ok(None);
            }
        };

        let message = QueueMessage {
            message_id: envelope.message_id,
            body: envelope.body,
            delivery_count: envelope.deliveries + 1,
            enqueued_at: envelope.enqueued_at,
            lock_token: Uuid::new_v4().to_string(),
        };
        self.track_raw(&message, raw);

        Ok(Some(message))
    }

    async fn complete(&self, message: &QueueMessage) -> Result<()> {
        let raw = self.take_raw(message)?;
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<i64> = conn.lrem(&self.processing_key, 1, &raw).await;
        if let Err(e) = result {
            self.track_raw(message, raw);
            return Err(e.into());
        }

        debug!(queue = %self.name, message_id = %message.message_id, "Message completed");
        Ok(())
    }

    async fn abandon(&self, message: &QueueMessage) -> Result<()> {
        let raw = self.take_raw(message)?;
        let envelope = Envelope {
            message_id: message.message_id.clone(),
            body: message.body.clone(),
            deliveries: message.delivery_count,
            enqueued_at: message.enqueued_at,
        };
        let requeued = serde_json::to_string(&envelope)?;

        let mut conn = self.conn.clone();
        let result: redis::RedisResult<()> = redis::pipe()
            .atomic()
            .lrem(&self.processing_key, 1, &raw)
            .ignore()
            .rpush(&self.pending_key, requeued)
            .ignore()
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            self.track_raw(message, raw);
            return Err(e.into());
        }

        debug!(
            queue = %self.name,
            message_id = %message.message_id,
            delivery_count = message.delivery_count,
            "Message abandoned"
        );
        Ok(())
    }

    async fn dead_letter(
        &self,
        message: &QueueMessage,
        reason: &str,
        description: &str,
    ) -> Result<()> {
        let raw = self.take_raw(message)?;
        let letter = serde_json::to_string(&DeadLetter {
            message: message.clone(),
            reason: reason.to_string(),
            description: description.to_string(),
            dead_lettered_at: Utc::now(),
        })?;

        let mut conn = self.conn.clone();
        let result: redis::RedisResult<()> = redis::pipe()
            .atomic()
            .lrem(&self.processing_key, 1, &raw)
            .ignore()
            .lpush(&self.dlq_key, letter)
            .ignore()
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            self.track_raw(message, raw);
            return Err(e.into());
        }

        warn!(
            queue = %self.name,
            message_id = %message.message_id,
            reason = %reason,
            "Message dead-lettered"
        );
        Ok(())
    }
}
