//! Task Queries

use crate::domain::task::{TaskId, TaskStatus};

/// 获取任务详情查询
#[derive(Debug, Clone, Copy)]
pub struct GetTask {
    pub task_id: TaskId,
}

/// 列出任务查询，可按状态过滤
#[derive(Debug, Clone, Copy, Default)]
pub struct ListTasks {
    pub status: Option<TaskStatus>,
}

/// 获取队列状态与统计查询
#[derive(Debug, Clone, Copy)]
pub struct GetQueueState;
