//! Generator Port - 文本生成引擎抽象
//!
//! 定义上游生成服务的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

/// 生成错误
///
/// 适配器负责把底层故障归入以下类别，重试策略据此决定是否重试
#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    /// 上游容量不足或限流（429/503/529）
    #[error("Upstream overloaded: {0}")]
    Overloaded(String),

    /// 上游服务端故障（其他 5xx）
    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(String),

    /// 请求被拒绝（参数校验、鉴权、内容审核等）
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 生成请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// 提示词
    pub prompt: String,
    /// 可选的上下文（前文窗口等）
    pub context: Option<String>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// 生成响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateResponse {
    pub text: String,
}

/// Generator Port
///
/// 外部生成服务的抽象接口，引擎不依赖具体提供方
#[async_trait]
pub trait GeneratorPort: Send + Sync {
    /// 执行一次生成调用
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, GeneratorError>;

    /// 检查生成服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
