//! Task Commands - 单任务命令

use crate::domain::task::{GenerationSettings, TaskId, TaskKind};

/// 提交生成任务命令
#[derive(Debug, Clone)]
pub struct EnqueueTask {
    pub title: String,
    pub kind: TaskKind,
    pub input: String,
    pub settings: GenerationSettings,
}

/// 移除任务命令
#[derive(Debug, Clone, Copy)]
pub struct RemoveTask {
    pub task_id: TaskId,
}

/// 取消任务命令
#[derive(Debug, Clone, Copy)]
pub struct CancelTask {
    pub task_id: TaskId,
}

/// 重新提交任务命令
#[derive(Debug, Clone, Copy)]
pub struct ResubmitTask {
    pub task_id: TaskId,
}
