//! Worker Layer - Background Task Processing
//!
//! 实现 WorkerPool，并发处理生成任务

mod generation_worker;

pub use generation_worker::{WorkerPool, WorkerPoolConfig};
