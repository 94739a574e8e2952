//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod generator;
mod prompt_strategy;
mod quota_gate;
mod task_queue;

pub use generator::{GenerateRequest, GenerateResponse, GeneratorError, GeneratorPort};
pub use prompt_strategy::{ChunkPromptContext, NormalizationPromptContext, PromptStrategy};
pub use quota_gate::{QuotaDecision, QuotaError, QuotaGatePort, QuotaUsage};
pub use task_queue::{
    ClaimedTask, NewTask, QueueStats, QueueSystemState, TaskQueuePort, TaskResolution,
};
