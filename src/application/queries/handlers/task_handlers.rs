//! Task Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{QueueSystemState, TaskQueuePort};
use crate::application::queries::{GetQueueState, GetTask, ListTasks};
use crate::domain::task::Task;

/// GetTask Handler
pub struct GetTaskHandler {
    queue: Arc<dyn TaskQueuePort>,
}

impl GetTaskHandler {
    pub fn new(queue: Arc<dyn TaskQueuePort>) -> Self {
        Self { queue }
    }

    pub fn handle(&self, query: GetTask) -> Result<Task, ApplicationError> {
        self.queue
            .get_task(query.task_id)
            .ok_or_else(|| ApplicationError::not_found("Task", query.task_id))
    }
}

/// ListTasks Handler
pub struct ListTasksHandler {
    queue: Arc<dyn TaskQueuePort>,
}

impl ListTasksHandler {
    pub fn new(queue: Arc<dyn TaskQueuePort>) -> Self {
        Self { queue }
    }

    pub fn handle(&self, query: ListTasks) -> Vec<Task> {
        let tasks = self.queue.list_tasks();
        match query.status {
            Some(status) => tasks.into_iter().filter(|t| t.status() == status).collect(),
            None => tasks,
        }
    }
}

/// GetQueueState Handler
pub struct GetQueueStateHandler {
    queue: Arc<dyn TaskQueuePort>,
}

impl GetQueueStateHandler {
    pub fn new(queue: Arc<dyn TaskQueuePort>) -> Self {
        Self { queue }
    }

    pub fn handle(&self, _query: GetQueueState) -> QueueSystemState {
        self.queue.system_state()
    }
}
