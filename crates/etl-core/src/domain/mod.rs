//! 도메인 모델.

pub mod dates;
pub mod download;
pub mod record;
pub mod request;

pub use dates::parse_calendar_date;
pub use download::{DownloadKey, DownloadLogEntry};
pub use record::{
    filter_by_date, group_by_date, parse_timestamp, ExtractionResult, StockRecord,
    CSV_TIMESTAMP_FORMAT,
};
pub use request::{EtlRequest, DEFAULT_INTERVAL};
