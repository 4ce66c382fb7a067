//! 설정 관리.
//!
//! 설정은 다음 순서로 병합됩니다 (뒤쪽이 우선):
//! 1. 기본값
//! 2. `config/default.toml` (있는 경우)
//! 3. `ETL_CONFIG` 환경변수가 가리키는 파일 (있는 경우)
//! 4. `ETL__` 접두사 환경변수 (예: `ETL__ALPHA_VANTAGE__API_KEY`)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::domain::DEFAULT_INTERVAL;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP 서버 설정
    pub server: ServerConfig,
    /// Alpha Vantage 제공자 설정
    pub alpha_vantage: AlphaVantageConfig,
    /// 다운로드 원장 설정
    pub download_tracking: DownloadTrackingConfig,
    /// CSV 내보내기 설정
    pub csv_export: CsvExportConfig,
    /// 큐 설정
    pub queue: QueueConfig,
    /// 백필 스케줄러 설정
    pub backfill: BackfillConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// `host:port` 문자열.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Alpha Vantage 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlphaVantageConfig {
    /// API 키
    pub api_key: SecretString,
    /// 쿼리 엔드포인트
    pub base_url: String,
    /// 기본 샘플링 간격
    pub interval: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        Self {
            api_key: SecretString::from("demo"),
            base_url: "https://www.alphavantage.co/query".to_string(),
            interval: DEFAULT_INTERVAL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl AlphaVantageConfig {
    /// 요청 타임아웃을 Duration으로 반환
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 다운로드 원장 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadTrackingConfig {
    /// 원장 JSON 파일 경로
    pub log_file_path: PathBuf,
}

impl Default for DownloadTrackingConfig {
    fn default() -> Self {
        Self {
            log_file_path: PathBuf::from("data/download_log.json"),
        }
    }
}

/// CSV 내보내기 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CsvExportConfig {
    /// 내보내기 기본 디렉토리
    pub export_path: PathBuf,
}

impl Default for CsvExportConfig {
    fn default() -> Self {
        Self {
            export_path: PathBuf::from("data/exports"),
        }
    }
}

/// 큐 백엔드 종류.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    /// 프로세스 내 큐 (재시작 시 유실)
    #[default]
    Memory,
    /// Redis 리스트 기반 큐
    Redis,
}

/// 큐 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// 백엔드
    pub backend: QueueBackend,
    /// Redis URL (backend = redis)
    pub redis_url: String,
    /// 큐 이름
    pub queue_name: String,
    /// 수신 대기 타임아웃 (초) - 종료 시그널 확인 주기
    pub poll_timeout_secs: u64,
    /// dead-letter 전 최대 전달 횟수
    pub max_retries: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::Memory,
            redis_url: "redis://localhost:6379/0".to_string(),
            queue_name: "etl-requests".to_string(),
            poll_timeout_secs: 5,
            max_retries: 3,
        }
    }
}

impl QueueConfig {
    /// 수신 대기 타임아웃을 Duration으로 반환
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

/// 백필 스케줄러 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    /// 스케줄러 활성화
    pub enabled: bool,
    /// 대상 심볼
    pub symbol: String,
    /// 샘플링 간격
    pub interval: String,
    /// 거슬러 올라갈 일수 (오늘 제외)
    pub days: u32,
    /// 실행 주기 (시간)
    pub period_hours: u64,
    /// 내보낸 날짜 사이 딜레이 (밀리초) - 제공자 rate limit 대응
    pub request_delay_ms: u64,
    /// 첫 실행 전 대기 (초)
    pub startup_delay_secs: u64,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            symbol: "AAPL".to_string(),
            interval: DEFAULT_INTERVAL.to_string(),
            days: 30,
            period_hours: 24,
            request_delay_ms: 15_000,
            startup_delay_secs: 0,
        }
    }
}

impl BackfillConfig {
    /// 실행 주기를 Duration으로 반환
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_hours.saturating_mul(60 * 60))
    }

    /// 날짜 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// 첫 실행 전 대기를 Duration으로 반환
    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Ok(path) = std::env::var("ETL_CONFIG") {
            builder = builder.add_source(config::File::with_name(&path));
        }

        builder
            .add_source(
                config::Environment::with_prefix("ETL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    /// 값 범위를 검증합니다.
    pub fn validated(self) -> Result<Self, config::ConfigError> {
        if self.backfill.enabled && self.backfill.period_hours == 0 {
            return Err(config::ConfigError::Message(
                "backfill.period_hours must be greater than 0".to_string(),
            ));
        }
        Ok(self)
    }
}
