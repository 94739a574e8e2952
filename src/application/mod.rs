//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Generator、QuotaGate、TaskQueue、PromptStrategy）
//! - pipeline: 分块生成流水线与重试
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    handlers::{
        CancelTaskHandler, CancelTaskResponse, ClearQueueHandler, EnqueueTaskHandler,
        QueueControlHandler, QueueControlResponse, RemoveTaskHandler, ResubmitTaskHandler,
    },
    CancelTask, ClearQueue, EnqueueTask, QueueControl, RemoveTask, ResubmitTask,
};

pub use error::ApplicationError;

pub use pipeline::{
    ChunkedGenerator, ChunkingConfig, GenerationOutcome, PipelineError, RetryExecutor,
    RetryPolicy, StrategyRegistry,
};

pub use ports::{
    ClaimedTask, GenerateRequest, GenerateResponse, GeneratorError, GeneratorPort, NewTask,
    PromptStrategy, QueueStats, QueueSystemState, QuotaDecision, QuotaError, QuotaGatePort,
    QuotaUsage, TaskQueuePort, TaskResolution,
};

pub use queries::{
    handlers::{GetQueueStateHandler, GetTaskHandler, ListTasksHandler},
    GetQueueState, GetTask, ListTasks,
};
