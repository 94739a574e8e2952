//! Events Layer - 引擎事件推送
//!
//! EventPublisher 负责广播，ProgressReporter 负责在队列锁内聚合统计

mod progress_reporter;
mod publisher;

pub use progress_reporter::{stats_consistent, ProgressReporter};
pub use publisher::{EngineEvent, EventPublisher};
