//! Quota Gate Port - 配额闸门
//!
//! 任务开始生成前由 Worker 查询，拒绝时任务进入 Failed 状态且不重试

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 配额闸门自身故障（与"拒绝"不同）
#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("Quota service unavailable: {0}")]
    Unavailable(String),
}

/// 配额用量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub current: u64,
    pub limit: u64,
    pub remaining: u64,
}

/// 配额判定结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub reason: Option<String>,
    pub usage: QuotaUsage,
}

impl QuotaDecision {
    pub fn allow(usage: QuotaUsage) -> Self {
        Self {
            allowed: true,
            reason: None,
            usage,
        }
    }

    pub fn deny(reason: impl Into<String>, usage: QuotaUsage) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            usage,
        }
    }
}

/// Quota Gate Port
#[async_trait]
pub trait QuotaGatePort: Send + Sync {
    /// 申请执行 action，消耗 units 个单位
    async fn admit(&self, action: &str, units: u64) -> Result<QuotaDecision, QuotaError>;
}
