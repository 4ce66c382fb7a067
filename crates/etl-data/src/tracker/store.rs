//! 원장 저장소 추상화.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use etl_core::{DownloadKey, Result};

/// 다운로드 완료 기록 저장소.
///
/// 키 유일성은 저장 시점에 보장됩니다.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// 키가 기록되어 있는지 확인합니다.
    async fn exists(&self, key: &DownloadKey) -> Result<bool>;

    /// 키를 기록합니다. 이미 있으면 `false`를 반환하고 아무것도 쓰지 않습니다.
    async fn insert(&self, key: DownloadKey) -> Result<bool>;

    /// 기록된 키 수.
    async fn len(&self) -> Result<usize>;
}

/// 메모리 원장 (테스트 및 일회성 실행용).
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: RwLock<HashSet<DownloadKey>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn exists(&self, key: &DownloadKey) -> Result<bool> {
        Ok(self.entries.read().await.contains(key))
    }

    async fn insert(&self, key: DownloadKey) -> Result<bool> {
        Ok(self.entries.write().await.insert(key))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }
}
