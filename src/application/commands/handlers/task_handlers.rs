//! Task Command Handlers

use std::sync::Arc;

use crate::application::commands::{CancelTask, EnqueueTask, RemoveTask, ResubmitTask};
use crate::application::error::ApplicationError;
use crate::application::ports::{NewTask, TaskQueuePort};
use crate::domain::task::{Task, TaskId};

// ============================================================================
// EnqueueTask
// ============================================================================

/// EnqueueTask Handler
pub struct EnqueueTaskHandler {
    queue: Arc<dyn TaskQueuePort>,
}

impl EnqueueTaskHandler {
    pub fn new(queue: Arc<dyn TaskQueuePort>) -> Self {
        Self { queue }
    }

    pub fn handle(&self, command: EnqueueTask) -> Result<TaskId, ApplicationError> {
        if command.input.trim().is_empty() {
            return Err(ApplicationError::validation("Task input cannot be empty"));
        }
        command.settings.validate()?;

        let title = if command.title.trim().is_empty() {
            format!("{} task", command.kind.as_str())
        } else {
            command.title
        };

        let task_id = self.queue.enqueue(NewTask {
            title,
            kind: command.kind,
            input: command.input,
            settings: command.settings,
        });

        tracing::info!(
            task_id = %task_id,
            kind = command.kind.as_str(),
            "Task enqueued"
        );

        Ok(task_id)
    }
}

// ============================================================================
// RemoveTask
// ============================================================================

/// RemoveTask Handler
pub struct RemoveTaskHandler {
    queue: Arc<dyn TaskQueuePort>,
}

impl RemoveTaskHandler {
    pub fn new(queue: Arc<dyn TaskQueuePort>) -> Self {
        Self { queue }
    }

    pub fn handle(&self, command: RemoveTask) -> Result<Task, ApplicationError> {
        let task = self.queue.remove(command.task_id)?;
        tracing::info!(task_id = %command.task_id, "Task removed");
        Ok(task)
    }
}

// ============================================================================
// CancelTask
// ============================================================================

/// 取消结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelTaskResponse {
    /// 是否发生了取消（已结束的任务为 false）
    pub canceled: bool,
}

/// CancelTask Handler
pub struct CancelTaskHandler {
    queue: Arc<dyn TaskQueuePort>,
}

impl CancelTaskHandler {
    pub fn new(queue: Arc<dyn TaskQueuePort>) -> Self {
        Self { queue }
    }

    pub fn handle(&self, command: CancelTask) -> Result<CancelTaskResponse, ApplicationError> {
        let canceled = self.queue.cancel(command.task_id)?;
        Ok(CancelTaskResponse { canceled })
    }
}

// ============================================================================
// ResubmitTask
// ============================================================================

/// ResubmitTask Handler
pub struct ResubmitTaskHandler {
    queue: Arc<dyn TaskQueuePort>,
}

impl ResubmitTaskHandler {
    pub fn new(queue: Arc<dyn TaskQueuePort>) -> Self {
        Self { queue }
    }

    pub fn handle(&self, command: ResubmitTask) -> Result<(), ApplicationError> {
        self.queue.resubmit(command.task_id)?;
        Ok(())
    }
}
