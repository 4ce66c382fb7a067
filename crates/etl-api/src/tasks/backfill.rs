//! 백필 스케줄러.
//!
//! 주기적으로 심볼의 전체 인트라데이 시계열을 한 번 추출한 뒤,
//! 오늘을 제외한 최근 N일을 하루씩 내보냅니다.
//! - 이미 처리된 날짜와 데이터가 없는 날짜는 건너뜀
//! - 하루 처리 실패는 기록만 하고 다음 날짜를 계속 처리
//! - 내보낸 날짜 사이에 딜레이로 제공자 rate limit 방지

use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use etl_core::{group_by_date, BackfillConfig, Result};

use crate::services::{DayOutcome, EtlPipeline};

/// 백필 실행 통계.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackfillStats {
    /// 대상 날짜 수
    pub total: usize,
    /// 내보낸 날짜 수
    pub success: usize,
    /// 이미 처리되어 건너뛴 날짜 수
    pub skipped: usize,
    /// 데이터가 없는 날짜 수
    pub empty: usize,
    /// 실패한 날짜 수
    pub errors: usize,
    /// 소요 시간
    pub elapsed: Duration,
}

impl BackfillStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, symbol: &str) {
        info!(
            symbol = %symbol,
            total = self.total,
            success = self.success,
            skipped = self.skipped,
            empty = self.empty,
            errors = self.errors,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "백필 완료"
        );
    }
}

/// `today` 이전 `days`일 (어제부터 과거 순).
fn backfill_dates(today: NaiveDate, days: u32) -> impl Iterator<Item = NaiveDate> {
    (1..=u64::from(days)).filter_map(move |offset| today.checked_sub_days(Days::new(offset)))
}

/// 백필을 한 번 실행합니다.
///
/// 추출이 실패하면 에러를 반환하고, 날짜별 실패는 통계에만 반영합니다.
/// 종료 토큰이 취소되면 남은 날짜를 처리하지 않고 반환합니다.
pub async fn run_backfill(
    pipeline: &EtlPipeline,
    config: &BackfillConfig,
    today: NaiveDate,
    shutdown_token: &CancellationToken,
) -> Result<BackfillStats> {
    let started = Instant::now();
    let symbol = config.symbol.as_str();
    let interval = config.interval.as_str();

    info!(symbol = %symbol, interval = %interval, days = config.days, "Backfill started");

    let data = pipeline.extract(symbol, interval).await?;
    let mut by_date = group_by_date(&data);

    let mut stats = BackfillStats::new();
    for date in backfill_dates(today, config.days) {
        if shutdown_token.is_cancelled() {
            info!(symbol = %symbol, "Backfill interrupted by shutdown");
            break;
        }

        stats.total += 1;
        let records = by_date.remove(&date).unwrap_or_default();

        match pipeline.export_day(symbol, date, interval, &records).await {
            Ok(DayOutcome::Exported(path)) => {
                stats.success += 1;
                debug!(symbol = %symbol, date = %date, path = %path.display(), "Backfilled day");

                if !config.request_delay().is_zero() {
                    tokio::select! {
                        _ = tokio::time::sleep(config.request_delay()) => {}
                        _ = shutdown_token.cancelled() => {}
                    }
                }
            }
            Ok(DayOutcome::Skipped) => stats.skipped += 1,
            Ok(DayOutcome::Empty) => stats.empty += 1,
            Err(e) => {
                stats.errors += 1;
                warn!(symbol = %symbol, date = %date, error = %e, "Backfill day failed");
            }
        }
    }

    stats.elapsed = started.elapsed();
    stats.log_summary(symbol);
    Ok(stats)
}

/// 백필 스케줄러 시작.
///
/// `startup_delay` 후 첫 실행, 이후 `period`마다 실행합니다.
pub fn start_backfill_scheduler(
    pipeline: std::sync::Arc<EtlPipeline>,
    config: BackfillConfig,
    shutdown_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            symbol = %config.symbol,
            interval = %config.interval,
            days = config.days,
            period_hours = config.period_hours,
            "백필 스케줄러 시작"
        );

        let mut wait = config.startup_delay();
        loop {
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown_token.cancelled() => {
                    info!("백필 스케줄러: 종료 시그널 수신");
                    break;
                }
            }

            let today = Utc::now().date_naive();
            if let Err(e) = run_backfill(&pipeline, &config, today, &shutdown_token).await {
                error!(symbol = %config.symbol, error = %e, "백필 실패");
            }

            wait = config.period();
        }

        info!("백필 스케줄러 종료됨");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backfill_dates_exclude_today() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 3).unwrap();
        let dates: Vec<NaiveDate> = backfill_dates(today, 3).collect();

        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
                NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
            ]
        );
    }

    #[test]
    fn test_backfill_dates_zero_days() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 3).unwrap();
        assert_eq!(backfill_dates(today, 0).count(), 0);
    }
}
