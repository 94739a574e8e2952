//! Task Context - 生成任务限界上下文
//!
//! 职责:
//! - 任务聚合与状态机
//! - 生成参数快照
//! - 质量分析报告

mod aggregate;
mod errors;
mod value_objects;

pub use aggregate::Task;
pub use errors::TaskError;
pub use value_objects::{
    GenerationSettings, QualityReport, SizeUnit, TaskId, TaskKind, TaskStatus,
};
