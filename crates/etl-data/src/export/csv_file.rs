//! CSV 파일 내보내기.
//!
//! 경로: `{export_path}/{SYMBOL}/{YYYY-MM-DD}/{SYMBOL}_{YYYY-MM-DD}.csv`

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use etl_core::{EtlError, Result, StockRecord};

use super::{ExportOutcome, Exporter};

const HEADER: [&str; 6] = ["Timestamp", "Open", "High", "Low", "Close", "Volume"];

/// CSV 내보내기.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    base_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// (심볼, 날짜)에 대한 출력 파일 경로. 심볼은 대문자로 정규화합니다.
    pub fn path_for(&self, symbol: &str, date: NaiveDate) -> PathBuf {
        let symbol = symbol.to_uppercase();
        let day = date.format("%Y-%m-%d").to_string();
        self.base_dir
            .join(&symbol)
            .join(&day)
            .join(format!("{}_{}.csv", symbol, day))
    }

    fn write_file(path: &Path, records: &[StockRecord]) -> std::result::Result<(), csv::Error> {
        let mut rows: Vec<&StockRecord> = records.iter().collect();
        rows.sort_by_key(|r| r.timestamp);

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(HEADER)?;
        for record in rows {
            let timestamp = record.formatted_timestamp();
            writer.write_record([
                timestamp.as_str(),
                record.open.as_str(),
                record.high.as_str(),
                record.low.as_str(),
                record.close.as_str(),
                record.volume.as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Exporter for CsvExporter {
    fn save(
        &self,
        records: &[StockRecord],
        symbol: &str,
        date: NaiveDate,
    ) -> Result<ExportOutcome> {
        if records.is_empty() {
            debug!(symbol = %symbol, date = %date, "No records to export");
            return Ok(ExportOutcome::NoData);
        }

        let path = self.path_for(symbol, date);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| EtlError::Export(format!("{}: {}", dir.display(), e)))?;
        }

        Self::write_file(&path, records)
            .map_err(|e| EtlError::Export(format!("{}: {}", path.display(), e)))?;

        info!(
            symbol = %symbol,
            date = %date,
            rows = records.len(),
            path = %path.display(),
            "Exported CSV"
        );

        Ok(ExportOutcome::Written(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    fn record(ts: &str, close: &str) -> StockRecord {
        StockRecord::new(
            NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
            "213.3200",
            "213.4000",
            "213.2000",
            close,
            "1520",
        )
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    #[test]
    fn test_path_layout() {
        let exporter = CsvExporter::new("data/exports");
        assert_eq!(
            exporter.path_for("AAPL", date()),
            PathBuf::from("data/exports/AAPL/2025-05-01/AAPL_2025-05-01.csv")
        );
    }

    #[test]
    fn test_lowercase_symbol_is_uppercased() {
        let dir = TempDir::new().unwrap();
        let exporter = CsvExporter::new(dir.path());

        let outcome = exporter
            .save(&[record("2025-05-01 04:00:00", "212.4000")], "aapl", date())
            .unwrap();

        let expected = dir
            .path()
            .join("AAPL")
            .join("2025-05-01")
            .join("AAPL_2025-05-01.csv");
        assert_eq!(outcome, ExportOutcome::Written(expected.clone()));
        assert!(expected.exists());
    }

    #[test]
    fn test_empty_records_write_nothing() {
        let dir = TempDir::new().unwrap();
        let exporter = CsvExporter::new(dir.path());

        let outcome = exporter.save(&[], "AAPL", date()).unwrap();

        assert_eq!(outcome, ExportOutcome::NoData);
        assert!(!dir.path().join("AAPL").exists());
    }

    #[test]
    fn test_rows_sorted_and_verbatim() {
        let dir = TempDir::new().unwrap();
        let exporter = CsvExporter::new(dir.path());
        let records = vec![
            record("2025-05-01 19:45:00", "213.3500"),
            record("2025-05-01 04:00:00", "212.4000"),
        ];

        let outcome = exporter.save(&records, "AAPL", date()).unwrap();
        let path = outcome.path().unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Timestamp,Open,High,Low,Close,Volume");
        assert_eq!(
            lines[1],
            "2025-05-01 04:00:00,213.3200,213.4000,213.2000,212.4000,1520"
        );
        assert!(lines[2].starts_with("2025-05-01 19:45:00"));
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let exporter = CsvExporter::new(dir.path());

        exporter
            .save(
                &[
                    record("2025-05-01 04:00:00", "1"),
                    record("2025-05-01 04:15:00", "2"),
                ],
                "AAPL",
                date(),
            )
            .unwrap();
        let outcome = exporter
            .save(&[record("2025-05-01 04:00:00", "3")], "AAPL", date())
            .unwrap();

        let content = std::fs::read_to_string(outcome.path().unwrap()).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
