//! Queue Command Handlers

use std::sync::Arc;

use crate::application::commands::{ClearQueue, QueueControl};
use crate::application::ports::{QueueSystemState, TaskQueuePort};

/// 队列控制响应
#[derive(Debug, Clone)]
pub struct QueueControlResponse {
    pub state: QueueSystemState,
    /// Stop 时被取消的任务数，其他动作为 0
    pub canceled: usize,
}

/// QueueControl Handler
pub struct QueueControlHandler {
    queue: Arc<dyn TaskQueuePort>,
}

impl QueueControlHandler {
    pub fn new(queue: Arc<dyn TaskQueuePort>) -> Self {
        Self { queue }
    }

    pub fn handle(&self, command: QueueControl) -> QueueControlResponse {
        let canceled = match command {
            QueueControl::Start => {
                self.queue.start();
                0
            }
            QueueControl::Pause => {
                self.queue.pause();
                0
            }
            QueueControl::Resume => {
                self.queue.resume();
                0
            }
            QueueControl::Stop => self.queue.stop(),
        };

        QueueControlResponse {
            state: self.queue.system_state(),
            canceled,
        }
    }
}

/// ClearQueue Handler
pub struct ClearQueueHandler {
    queue: Arc<dyn TaskQueuePort>,
}

impl ClearQueueHandler {
    pub fn new(queue: Arc<dyn TaskQueuePort>) -> Self {
        Self { queue }
    }

    pub fn handle(&self, _command: ClearQueue) -> QueueSystemState {
        self.queue.clear();
        self.queue.system_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::NewTask;
    use crate::domain::task::{GenerationSettings, TaskKind};
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::memory::InMemoryTaskQueue;

    #[test]
    fn test_control_sequence() {
        let queue: Arc<dyn TaskQueuePort> =
            InMemoryTaskQueue::new(EventPublisher::new().arc()).arc();
        queue.enqueue(NewTask {
            title: "t".to_string(),
            kind: TaskKind::Story,
            input: "outline".to_string(),
            settings: GenerationSettings::new(100),
        });
        let handler = QueueControlHandler::new(queue.clone());

        let started = handler.handle(QueueControl::Start);
        assert!(started.state.is_processing);
        assert!(!started.state.is_paused);

        assert!(handler.handle(QueueControl::Pause).state.is_paused);
        assert!(!handler.handle(QueueControl::Resume).state.is_paused);

        let stopped = handler.handle(QueueControl::Stop);
        assert_eq!(stopped.canceled, 1);
        assert!(!stopped.state.is_processing);

        let cleared = ClearQueueHandler::new(queue.clone()).handle(ClearQueue);
        assert_eq!(cleared.stats.total_count, 0);
        assert!(queue.list_tasks().is_empty());
    }
}
