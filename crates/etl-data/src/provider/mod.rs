//! 시계열 데이터 Provider 모듈.
//!
//! ## Alpha Vantage
//! - `AlphaVantageClient`: `TIME_SERIES_INTRADAY` 엔드포인트 클라이언트 (API 키 필요)
//! - 인트라데이 OHLCV, 제공자 응답 문자열을 그대로 보존

pub mod alpha_vantage;

use async_trait::async_trait;
use etl_core::{ExtractionResult, Result};

pub use alpha_vantage::{parse_time_series, AlphaVantageClient};

/// 인트라데이 시계열 데이터 소스.
///
/// 파이프라인은 이 trait에만 의존하므로 테스트에서 스텁으로 대체할 수 있습니다.
#[async_trait]
pub trait StockDataSource: Send + Sync {
    /// Provider 이름.
    fn name(&self) -> &str;

    /// 심볼의 최근 인트라데이 시계열을 가져옵니다.
    ///
    /// 결과가 비어 있을 수 있으며, 빈 결과의 처리는 호출자가 결정합니다.
    async fn extract(&self, symbol: &str, interval: &str) -> Result<ExtractionResult>;
}
