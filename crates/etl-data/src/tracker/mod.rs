//! 다운로드 원장.
//!
//! (심볼, 날짜, 간격) 단위로 처리 완료 여부를 기록합니다.
//! 동기 API, 큐 소비자, 백필 스케줄러가 같은 키를 동시에 처리하지 않도록
//! 키별 비동기 잠금([`KeyGuard`])을 제공합니다.

mod json_file;
mod store;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info};

use etl_core::{DownloadKey, Result};

pub use json_file::JsonFileLedger;
pub use store::{LedgerStore, MemoryLedger};

type LockTable = Arc<Mutex<HashMap<DownloadKey, Arc<AsyncMutex<()>>>>>;

/// 다운로드 추적기.
#[derive(Clone)]
pub struct DownloadTracker {
    store: Arc<dyn LedgerStore>,
    locks: LockTable,
}

impl DownloadTracker {
    /// 저장소로 추적기를 생성합니다.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// 이미 처리된 (심볼, 날짜, 간격)인지 확인합니다.
    pub async fn has_already_downloaded(
        &self,
        symbol: &str,
        date: NaiveDate,
        interval: &str,
    ) -> Result<bool> {
        let key = DownloadKey::new(symbol, date, interval);
        let exists = self.store.exists(&key).await?;
        debug!(key = %key, exists, "Checked download ledger");
        Ok(exists)
    }

    /// 처리 완료로 기록합니다.
    ///
    /// 새로 기록했으면 `true`, 이미 있었으면 `false`.
    pub async fn mark_as_downloaded(
        &self,
        symbol: &str,
        date: NaiveDate,
        interval: &str,
    ) -> Result<bool> {
        let key = DownloadKey::new(symbol, date, interval);
        let inserted = self.store.insert(key.clone()).await?;
        if inserted {
            info!(key = %key, "Marked as downloaded");
        }
        Ok(inserted)
    }

    /// 키에 대한 배타적 잠금을 획득합니다.
    ///
    /// 가드가 살아있는 동안 같은 키로 `lock`을 호출한 다른 작업은 대기합니다.
    pub async fn lock(&self, key: &DownloadKey) -> KeyGuard {
        let entry = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        KeyGuard {
            guard: Some(entry.lock_owned().await),
            key: key.clone(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// 현재 잠금 테이블 크기.
    pub fn active_locks(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or_default()
    }
}

/// 키별 잠금 가드.
///
/// 드롭 시 대기자가 없으면 잠금 테이블에서 항목을 제거합니다.
pub struct KeyGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: DownloadKey,
    locks: LockTable,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        self.guard.take();

        // 테이블 외에 참조가 없으면 대기자 없음
        if locks
            .get(&self.key)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&self.key);
        }
    }
}
