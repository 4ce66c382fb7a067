//! JSON 파일 원장.
//!
//! 파일은 `[{"symbol", "date", "interval"}, ...]` 배열이며, 삽입마다 전체를
//! 임시 파일에 쓴 뒤 rename으로 교체합니다. 모든 연산은 하나의 mutex로 직렬화됩니다.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use etl_core::{DownloadKey, DownloadLogEntry, EtlError, Result};

use super::LedgerStore;

/// JSON 파일 기반 원장.
#[derive(Debug)]
pub struct JsonFileLedger {
    path: PathBuf,
    entries: Mutex<Vec<DownloadLogEntry>>,
}

impl JsonFileLedger {
    /// 원장 파일을 엽니다.
    ///
    /// 파일이 없으면 빈 원장으로 시작하고, 비어 있거나 형식이 잘못되었으면 에러를 반환합니다.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = load_entries(&path)?;

        info!(path = %path.display(), entries = entries.len(), "Download ledger loaded");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// 원장 파일 경로.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &[DownloadLogEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ledger_error(&self.path, e))?;
        }

        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| ledger_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ledger_error(&self.path, e))
    }
}

fn load_entries(path: &Path) -> Result<Vec<DownloadLogEntry>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ledger_error(path, e)),
    };

    let loaded: Vec<DownloadLogEntry> = serde_json::from_str(&raw)
        .map_err(|e| EtlError::Ledger(format!("{} is malformed: {}", path.display(), e)))?;

    let mut entries: Vec<DownloadLogEntry> = Vec::with_capacity(loaded.len());
    let mut duplicates = 0usize;
    for entry in loaded {
        if entries.contains(&entry) {
            duplicates += 1;
        } else {
            entries.push(entry);
        }
    }

    if duplicates > 0 {
        warn!(path = %path.display(), duplicates, "Ignoring duplicate ledger entries");
    }

    Ok(entries)
}

fn ledger_error(path: &Path, err: std::io::Error) -> EtlError {
    EtlError::Ledger(format!("{}: {}", path.display(), err))
}

#[async_trait]
impl LedgerStore for JsonFileLedger {
    async fn exists(&self, key: &DownloadKey) -> Result<bool> {
        Ok(self.entries.lock().await.contains(key))
    }

    async fn insert(&self, key: DownloadKey) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        if entries.contains(&key) {
            debug!(key = %key, "Ledger entry already present");
            return Ok(false);
        }

        entries.push(key);
        if let Err(e) = self.persist(&entries).await {
            entries.pop();
            return Err(e);
        }

        Ok(true)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.lock().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn key(day: u32) -> DownloadKey {
        DownloadKey::new("AAPL", NaiveDate::from_ymd_opt(2025, 5, day).unwrap(), "15min")
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = JsonFileLedger::open(dir.path().join("download_log.json")).unwrap();

        assert_eq!(ledger.len().await.unwrap(), 0);
        assert!(!ledger.exists(&key(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("download_log.json");

        let ledger = JsonFileLedger::open(&path).unwrap();
        assert!(ledger.insert(key(1)).await.unwrap());
        assert!(ledger.insert(key(2)).await.unwrap());
        assert!(!ledger.insert(key(1)).await.unwrap());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains(r#""date": "2025-05-01""#));
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = JsonFileLedger::open(&path).unwrap();
        assert_eq!(reopened.len().await.unwrap(), 2);
        assert!(reopened.exists(&key(2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_reads_legacy_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("download_log.json");
        std::fs::write(
            &path,
            r#"[
                {"Symbol": "AAPL", "Date": "2025-05-01T00:00:00", "Interval": "15min"},
                {"Symbol": "AAPL", "Date": "2025-05-01T00:00:00", "Interval": "15min"}
            ]"#,
        )
        .unwrap();

        let ledger = JsonFileLedger::open(&path).unwrap();
        assert_eq!(ledger.len().await.unwrap(), 1);
        assert!(ledger.exists(&key(1)).await.unwrap());
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("download_log.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonFileLedger::open(&path),
            Err(EtlError::Ledger(_))
        ));
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("download_log.json");

        for content in ["", "  \n"] {
            std::fs::write(&path, content).unwrap();
            assert!(matches!(
                JsonFileLedger::open(&path),
                Err(EtlError::Ledger(_))
            ));
        }
    }
}
