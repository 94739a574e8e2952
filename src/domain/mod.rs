//! Domain Layer - 领域层
//!
//! 包含:
//! - Task Context: 生成任务与状态机
//! - 分块计划与长度修正判断

pub mod task;

mod chunk_plan;

pub use chunk_plan::{
    context_window, ChunkPlan, ChunkSpec, LengthAdjustment, DEFAULT_CHUNK_SIZE,
    DEFAULT_CONTEXT_WINDOW, DEFAULT_TOLERANCE,
};
