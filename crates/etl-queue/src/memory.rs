//! 프로세스 내 메시지 큐.
//!
//! 재시작하면 내용이 유실됩니다. 테스트와 단일 프로세스 배포용입니다.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{QueueError, Result};
use crate::message::{DeadLetter, MessageQueue, QueueMessage};

#[derive(Debug, Clone)]
struct Pending {
    message_id: String,
    body: String,
    deliveries: u32,
    enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    pending: VecDeque<Pending>,
    in_flight: HashMap<String, Pending>,
    dead_letters: Vec<DeadLetter>,
}

/// 메모리 큐.
#[derive(Debug)]
pub struct MemoryQueue {
    name: String,
    state: Mutex<State>,
    notify: Notify,
}

impl MemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(State::default()),
            notify: Notify::new(),
        }
    }

    /// 대기 중인 메시지 수.
    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// 처리 중(미정산) 메시지 수.
    pub async fn in_flight_len(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    /// dead-letter 큐 내용.
    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.state.lock().await.dead_letters.clone()
    }

    async fn take_in_flight(&self, message: &QueueMessage) -> Result<Pending> {
        self.state
            .lock()
            .await
            .in_flight
            .remove(&message.lock_token)
            .ok_or_else(|| QueueError::LockLost(message.message_id.clone()))
    }

    async fn try_pop(&self) -> Option<QueueMessage> {
        let mut state = self.state.lock().await;
        let mut pending = state.pending.pop_front()?;
        pending.deliveries += 1;

        let message = QueueMessage {
            message_id: pending.message_id.clone(),
            body: pending.body.clone(),
            delivery_count: pending.deliveries,
            enqueued_at: pending.enqueued_at,
            lock_token: Uuid::new_v4().to_string(),
        };
        state.in_flight.insert(message.lock_token.clone(), pending);

        Some(message)
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, body: String) -> Result<String> {
        let message_id = Uuid::new_v4().to_string();
        self.state.lock().await.pending.push_back(Pending {
            message_id: message_id.clone(),
            body,
            deliveries: 0,
            enqueued_at: Utc::now(),
        });
        self.notify.notify_one();

        debug!(queue = %self.name, message_id = %message_id, "Message enqueued");
        Ok(message_id)
    }

    async fn receive(&self, timeout: Duration) -> Result<Option<QueueMessage>> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some(message) = self.try_pop().await {
                return Ok(Some(message));
            }

            if tokio::time::timeout_at(deadline, self.notify.notified())
                .await
                .is_err()
            {
                return Ok(None);
            }
        }
    }

    async fn complete(&self, message: &QueueMessage) -> Result<()> {
        self.take_in_flight(message).await?;
        debug!(queue = %self.name, message_id = %message.message_id, "Message completed");
        Ok(())
    }

    async fn abandon(&self, message: &QueueMessage) -> Result<()> {
        let pending = self.take_in_flight(message).await?;
        self.state.lock().await.pending.push_front(pending);
        self.notify.notify_one();

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
        self.take_in_flight(message).await?;
        self.state.lock().await.dead_letters.push(DeadLetter {
            message: message.clone(),
            reason: reason.to_string(),
            description: description.to_string(),
            dead_lettered_at: Utc::now(),
        });

        warn!(
            queue = %self.name,
            message_id = %message.message_id,
            reason = %reason,
            "Message dead-lettered"
        );
        Ok(())
    }
}
