//! 서비스 레이어.

pub mod pipeline;

pub use pipeline::{DayOutcome, EtlPipeline, RunOutcome};
