//! 백그라운드 태스크 모듈.
//!
//! 서버 실행 중 동작하는 백그라운드 작업을 정의합니다.
//! - 큐 소비자: 큐로 들어온 ETL 요청을 하나씩 처리
//! - 백필 스케줄러: 최근 N일 데이터를 주기적으로 채움

pub mod backfill;
pub mod queue_consumer;

pub use backfill::{run_backfill, start_backfill_scheduler, BackfillStats};
pub use queue_consumer::{
    handle_message, process_message, start_queue_consumer, Completion, DeadLetterReason,
    MessageOutcome, QueueConsumerConfig,
};
