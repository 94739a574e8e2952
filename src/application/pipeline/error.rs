//! Pipeline 错误定义

use thiserror::Error;

/// 生成流水线错误
///
/// `Canceled` 不是错误状态，Worker 会把它记录为任务的 Canceled
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Operation canceled")]
    Canceled,

    /// 不可重试的失败，只尝试一次
    #[error("{0}")]
    Permanent(String),

    /// 可重试错误在用尽重试次数后重新抛出，保留最后一次的原始信息
    #[error("{message}")]
    Exhausted { attempts: u32, message: String },
}

impl PipelineError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, PipelineError::Canceled)
    }
}
