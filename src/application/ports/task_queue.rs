//! Task Queue Port - 生成任务队列
//!
//! 定义任务队列的抽象接口，具体实现在 infrastructure/memory 层

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::domain::task::{
    GenerationSettings, QualityReport, Task, TaskError, TaskId, TaskKind, TaskStatus,
};

/// 新任务参数
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub kind: TaskKind,
    pub input: String,
    pub settings: GenerationSettings,
}

/// 队列统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    pub completed_count: usize,
    pub total_count: usize,
    /// 已完成任务的平均处理时间（毫秒）
    pub average_processing_time_ms: f64,
}

/// 队列系统状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueSystemState {
    pub is_enabled: bool,
    pub is_paused: bool,
    pub is_processing: bool,
    /// 正在处理的任务，每个忙碌的 Worker 一个
    pub current_items: Vec<TaskId>,
    pub stats: QueueStats,
}

/// Worker 认领到的任务
#[derive(Debug, Clone)]
pub struct ClaimedTask {
    /// 认领时的任务快照（状态为 Processing）
    pub task: Task,
    /// 该任务专属的取消令牌
    pub cancel: CancellationToken,
}

/// 任务的运行结果，由 Worker 交回队列记录
#[derive(Debug, Clone)]
pub enum TaskResolution {
    Completed {
        output: String,
        analysis: Option<QualityReport>,
    },
    /// 上游生成失败
    Error(String),
    /// 配额拒绝
    QuotaDenied(String),
    Canceled,
}

impl TaskResolution {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskResolution::Completed { .. } => TaskStatus::Completed,
            TaskResolution::Error(_) => TaskStatus::Error,
            TaskResolution::QuotaDenied(_) => TaskStatus::Failed,
            TaskResolution::Canceled => TaskStatus::Canceled,
        }
    }
}

/// Task Queue Port
///
/// 管理任务生命周期与队列状态，所有状态存储在内存中。
/// 调用方命令与 Worker 回调都经过这里，统计数据只在此处更新
pub trait TaskQueuePort: Send + Sync {
    // ========== 调用方命令 ==========

    /// 追加任务，状态为 Waiting，总是成功
    fn enqueue(&self, task: NewTask) -> TaskId;

    /// 移除任务，Processing 状态的任务需先取消
    fn remove(&self, task_id: TaskId) -> Result<Task, TaskError>;

    /// 取消所有进行中的任务，清空队列并重置统计
    fn clear(&self);

    /// 开始处理
    fn start(&self);

    /// 暂停认领新任务，不打断正在处理的任务
    fn pause(&self);

    /// 恢复认领
    fn resume(&self);

    /// 取消所有 Processing/Waiting 任务并停止处理，返回取消数量
    fn stop(&self) -> usize;

    /// 取消单个任务，返回是否发生了取消（终态任务为空操作）
    fn cancel(&self, task_id: TaskId) -> Result<bool, TaskError>;

    /// 把 Error/Canceled 任务重新放回队尾
    fn resubmit(&self, task_id: TaskId) -> Result<(), TaskError>;

    // ========== 查询 ==========

    fn get_task(&self, task_id: TaskId) -> Option<Task>;

    /// 按入队顺序列出全部任务
    fn list_tasks(&self) -> Vec<Task>;

    fn system_state(&self) -> QueueSystemState;

    // ========== Worker 回调 ==========

    /// 原子地认领最早的 Waiting 任务；暂停、未启动或无任务时返回 None
    fn claim_next(&self) -> Option<ClaimedTask>;

    /// 更新 Processing 任务的进度（单调不减）
    fn update_progress(&self, task_id: TaskId, progress: u8);

    /// 记录任务终态并释放 Worker 槽位
    fn finish(&self, task_id: TaskId, resolution: TaskResolution);

    /// 有新工作可认领时被唤醒
    fn work_notifier(&self) -> Arc<Notify>;
}
