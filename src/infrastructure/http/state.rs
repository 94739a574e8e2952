//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CancelTaskHandler, ClearQueueHandler, EnqueueTaskHandler, QueueControlHandler,
    RemoveTaskHandler, ResubmitTaskHandler,
    // Query handlers
    GetQueueStateHandler, GetTaskHandler, ListTasksHandler,
    // Ports
    TaskQueuePort,
};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub queue: Arc<dyn TaskQueuePort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub enqueue_task_handler: EnqueueTaskHandler,
    pub remove_task_handler: RemoveTaskHandler,
    pub cancel_task_handler: CancelTaskHandler,
    pub resubmit_task_handler: ResubmitTaskHandler,
    pub queue_control_handler: QueueControlHandler,
    pub clear_queue_handler: ClearQueueHandler,

    // ========== Query Handlers ==========
    pub get_task_handler: GetTaskHandler,
    pub list_tasks_handler: ListTasksHandler,
    pub get_queue_state_handler: GetQueueStateHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(queue: Arc<dyn TaskQueuePort>, event_publisher: Arc<EventPublisher>) -> Self {
        Self {
            // Ports
            queue: queue.clone(),
            event_publisher,

            // Command handlers
            enqueue_task_handler: EnqueueTaskHandler::new(queue.clone()),
            remove_task_handler: RemoveTaskHandler::new(queue.clone()),
            cancel_task_handler: CancelTaskHandler::new(queue.clone()),
            resubmit_task_handler: ResubmitTaskHandler::new(queue.clone()),
            queue_control_handler: QueueControlHandler::new(queue.clone()),
            clear_queue_handler: ClearQueueHandler::new(queue.clone()),

            // Query handlers
            get_task_handler: GetTaskHandler::new(queue.clone()),
            list_tasks_handler: ListTasksHandler::new(queue.clone()),
            get_queue_state_handler: GetQueueStateHandler::new(queue),
        }
    }
}
