//! 生成流水线
//!
//! - retry: 上游调用的分类重试与可取消退避
//! - chunked_generator: 分块生成、长度修正、质量分析
//! - strategies: 各任务类型的提示词策略

mod chunked_generator;
mod error;
mod retry;
mod strategies;

pub use chunked_generator::{ChunkedGenerator, ChunkingConfig, GenerationOutcome};
pub use error::PipelineError;
pub use retry::{
    cancellable_sleep, ErrorClass, RetryExecutor, RetryPolicy, DEFAULT_MAX_RETRIES,
    DEFAULT_OVERLOAD_BASE_DELAY, DEFAULT_SERVER_BASE_DELAY,
};
pub use strategies::{HookStrategy, RewriteStrategy, StoryStrategy, StrategyRegistry};
