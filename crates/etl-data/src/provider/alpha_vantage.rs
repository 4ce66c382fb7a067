//! Alpha Vantage 인트라데이 클라이언트.
//!
//! # 요청
//!
//! `GET {base_url}?function=TIME_SERIES_INTRADAY&symbol=..&interval=..&outputsize=full&apikey=..`
//!
//! # 응답
//!
//! ```json
//! {
//!   "Meta Data": { ... },
//!   "Time Series (15min)": {
//!     "2025-05-01 19:45:00": {
//!       "1. open": "213.3200", "2. high": "213.4000", "3. low": "213.2000",
//!       "4. close": "213.3500", "5. volume": "1520"
//!     }
//!   }
//! }
//! ```
//!
//! 호출 한도를 초과하면 시계열 대신 `Note` 또는 `Information` 필드만 내려옵니다.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::{debug, info, trace, warn};

use etl_core::{
    parse_timestamp, AlphaVantageConfig, EtlError, ExtractionResult, Result, StockRecord,
};

use super::StockDataSource;

/// 레코드 필드 키 (open, high, low, close, volume 순).
const FIELD_KEYS: [&str; 5] = ["1. open", "2. high", "3. low", "4. close", "5. volume"];

/// 시계열 대신 내려오는 제공자 안내 필드.
const NOTICE_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

/// Alpha Vantage API 클라이언트.
#[derive(Clone)]
pub struct AlphaVantageClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl AlphaVantageClient {
    /// 설정으로 클라이언트를 생성합니다.
    ///
    /// 모든 요청에 `timeout_secs` 데드라인이 적용됩니다.
    pub fn new(config: &AlphaVantageConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EtlError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        })
    }

    /// 엔드포인트를 변경합니다 (테스트/프록시용).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_body(&self, symbol: &str, interval: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", symbol),
                ("interval", interval),
                ("outputsize", "full"),
                ("apikey", self.api_key.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| EtlError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::ProviderUnavailable(format!(
                "HTTP status {}",
                status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| EtlError::ProviderUnavailable(e.to_string()))
    }
}

#[async_trait]
impl StockDataSource for AlphaVantageClient {
    fn name(&self) -> &str {
        "AlphaVantage"
    }

    async fn extract(&self, symbol: &str, interval: &str) -> Result<ExtractionResult> {
        if symbol.trim().is_empty() {
            return Err(EtlError::InvalidInput("symbol must not be empty".into()));
        }
        if interval.trim().is_empty() {
            return Err(EtlError::InvalidInput("interval must not be empty".into()));
        }

        debug!(symbol = %symbol, interval = %interval, "Requesting intraday time series");

        let body = self.fetch_body(symbol, interval).await?;
        let records = parse_time_series(&body, interval)?;

        info!(
            symbol = %symbol,
            interval = %interval,
            records = records.len(),
            "Extracted intraday time series"
        );

        Ok(records)
    }
}

/// 응답 본문에서 `Time Series ({interval})` 객체를 파싱합니다.
///
/// 타임스탬프 키를 해석할 수 없는 항목은 건너뜁니다.
pub fn parse_time_series(body: &str, interval: &str) -> Result<ExtractionResult> {
    let root: Value =
        serde_json::from_str(body).map_err(|e| EtlError::ParsingFailed(e.to_string()))?;

    let series_key = format!("Time Series ({})", interval);
    let series = match root.get(&series_key) {
        Some(Value::Object(series)) => series,
        Some(_) => {
            return Err(EtlError::NoTimeSeries(format!(
                "'{}' is not an object",
                series_key
            )))
        }
        None => {
            let detail = provider_notice(&root)
                .map(|notice| format!("'{}' missing ({})", series_key, notice))
                .unwrap_or_else(|| format!("'{}' missing", series_key));
            warn!(detail = %detail, "Provider response has no time series");
            return Err(EtlError::NoTimeSeries(detail));
        }
    };

    let mut records = ExtractionResult::new();
    for (key, entry) in series {
        let Some(timestamp) = parse_timestamp(key) else {
            trace!(key = %key, "Skipping entry with unparseable timestamp");
            continue;
        };

        let fields = entry
            .as_object()
            .ok_or_else(|| EtlError::ParsingFailed(format!("entry '{}' is not an object", key)))?;

        let [open, high, low, close, volume] = FIELD_KEYS.map(|name| field(fields, key, name));

        records.insert(
            key.clone(),
            StockRecord::new(timestamp, open?, high?, low?, close?, volume?),
        );
    }

    Ok(records)
}

fn field(entry: &Map<String, Value>, key: &str, name: &str) -> Result<String> {
    entry
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| EtlError::ParsingFailed(format!("entry '{}' missing '{}'", key, name)))
}

fn provider_notice(root: &Value) -> Option<String> {
    NOTICE_KEYS.iter().find_map(|name| {
        root.get(*name)
            .and_then(Value::as_str)
            .map(|text| format!("{}: {}", name, text))
    })
}
