//! Task Context - Errors

use thiserror::Error;

use super::{TaskId, TaskStatus};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("任务不存在: {0}")]
    NotFound(TaskId),

    #[error("无效的状态转换: 任务 {task_id} 处于 {from}，不能执行 {action}")]
    InvalidStateTransition {
        task_id: TaskId,
        from: TaskStatus,
        action: &'static str,
    },

    #[error("无效的任务参数: {0}")]
    InvalidSettings(String),
}

impl TaskError {
    pub fn invalid_transition(task_id: TaskId, from: TaskStatus, action: &'static str) -> Self {
        Self::InvalidStateTransition {
            task_id,
            from,
            action,
        }
    }
}
