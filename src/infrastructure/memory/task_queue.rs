//! In-Memory Task Queue Implementation

use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    ClaimedTask, NewTask, QueueSystemState, TaskQueuePort, TaskResolution,
};
use crate::domain::task::{Task, TaskError, TaskId, TaskStatus};
use crate::infrastructure::events::{EventPublisher, ProgressReporter};

const STOPPED_REASON: &str = "Stopped by user";
const CANCELED_REASON: &str = "Canceled by user";

/// 锁内状态：任务列表、队列标志和统计一起更新
struct QueueInner {
    /// 按入队顺序保存
    tasks: Vec<Task>,
    is_enabled: bool,
    is_paused: bool,
    is_processing: bool,
    current_items: Vec<TaskId>,
    reporter: ProgressReporter,
}

impl QueueInner {
    fn position(&self, task_id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id() == task_id)
    }

    fn task_mut(&mut self, task_id: TaskId) -> Result<&mut Task, TaskError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id() == task_id)
            .ok_or(TaskError::NotFound(task_id))
    }

    fn snapshot(&self) -> QueueSystemState {
        QueueSystemState {
            is_enabled: self.is_enabled,
            is_paused: self.is_paused,
            is_processing: self.is_processing,
            current_items: self.current_items.clone(),
            stats: self.reporter.stats(),
        }
    }

    fn release_slot(&mut self, task_id: TaskId) {
        self.current_items.retain(|id| *id != task_id);
    }
}

/// 内存任务队列
///
/// 认领、状态转换和统计更新都在同一把互斥锁内完成，
/// 每个任务持有独立的取消令牌
pub struct InMemoryTaskQueue {
    inner: Mutex<QueueInner>,
    /// task_id -> 取消令牌（仅 Processing 任务）
    tokens: DashMap<TaskId, CancellationToken>,
    /// 唤醒空闲 Worker
    notify: Arc<Notify>,
}

impl InMemoryTaskQueue {
    pub fn new(events: Arc<EventPublisher>) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                tasks: Vec::new(),
                is_enabled: false,
                is_paused: false,
                is_processing: false,
                current_items: Vec::new(),
                reporter: ProgressReporter::new(events),
            }),
            tokens: DashMap::new(),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wake_workers(&self) {
        self.notify.notify_waiters();
    }

    fn cancel_token(&self, task_id: TaskId) {
        if let Some(token) = self.tokens.get(&task_id) {
            token.cancel();
        }
    }
}

impl TaskQueuePort for InMemoryTaskQueue {
    fn enqueue(&self, new_task: NewTask) -> TaskId {
        let task = Task::new(new_task.title, new_task.kind, new_task.input, new_task.settings);
        let task_id = task.id();

        {
            let mut inner = self.lock();
            inner.reporter.task_updated(&task);
            inner.tasks.push(task);
            inner.reporter.task_added();
        }

        tracing::debug!(task_id = %task_id, "Task enqueued");
        self.wake_workers();
        task_id
    }

    fn remove(&self, task_id: TaskId) -> Result<Task, TaskError> {
        let mut inner = self.lock();
        let index = inner
            .position(task_id)
            .ok_or(TaskError::NotFound(task_id))?;

        let status = inner.tasks[index].status();
        if !status.can_remove() {
            return Err(TaskError::invalid_transition(task_id, status, "remove"));
        }

        let task = inner.tasks.remove(index);
        inner.reporter.task_removed(status);
        inner.reporter.events().publish_task_removed(task_id);

        tracing::debug!(task_id = %task_id, status = %status, "Task removed");
        Ok(task)
    }

    fn clear(&self) {
        let removed = {
            let mut inner = self.lock();
            for entry in self.tokens.iter() {
                entry.value().cancel();
            }
            let removed: Vec<TaskId> = inner.tasks.drain(..).map(|t| t.id()).collect();
            inner.current_items.clear();
            for task_id in &removed {
                inner.reporter.events().publish_task_removed(*task_id);
            }
            inner.reporter.reset();
            removed.len()
        };

        tracing::info!(removed = removed, "Queue cleared");
        self.wake_workers();
    }

    fn start(&self) {
        {
            let mut inner = self.lock();
            inner.is_enabled = true;
            inner.is_processing = true;
            let state = inner.snapshot();
            inner.reporter.events().publish_queue_state(&state);
        }
        tracing::info!("Queue processing started");
        self.wake_workers();
    }

    fn pause(&self) {
        let mut inner = self.lock();
        inner.is_paused = true;
        let state = inner.snapshot();
        inner.reporter.events().publish_queue_state(&state);
        tracing::info!("Queue paused");
    }

    fn resume(&self) {
        {
            let mut inner = self.lock();
            inner.is_paused = false;
            let state = inner.snapshot();
            inner.reporter.events().publish_queue_state(&state);
        }
        tracing::info!("Queue resumed");
        self.wake_workers();
    }

    fn stop(&self) -> usize {
        let mut inner = self.lock();
        let mut canceled = 0;

        for index in 0..inner.tasks.len() {
            let status = inner.tasks[index].status();
            if !matches!(status, TaskStatus::Waiting | TaskStatus::Processing) {
                continue;
            }
            let task_id = inner.tasks[index].id();
            if status == TaskStatus::Processing {
                self.cancel_token(task_id);
            }
            if inner.tasks[index].cancel(Some(STOPPED_REASON.to_string())) {
                canceled += 1;
                inner.reporter.task_updated(&inner.tasks[index]);
            }
        }

        inner.is_processing = false;
        let state = inner.snapshot();
        inner.reporter.events().publish_queue_state(&state);

        tracing::info!(canceled = canceled, "Queue stopped");
        canceled
    }

    fn cancel(&self, task_id: TaskId) -> Result<bool, TaskError> {
        let mut inner = self.lock();
        let task = inner.task_mut(task_id)?;
        let status = task.status();

        if status.is_terminal() {
            tracing::debug!(
                task_id = %task_id,
                status = %status,
                "Cancel ignored for finished task"
            );
            return Ok(false);
        }

        if status == TaskStatus::Processing {
            self.cancel_token(task_id);
        }
        task.cancel(Some(CANCELED_REASON.to_string()));
        let task = task.clone();
        inner.reporter.task_updated(&task);

        tracing::info!(task_id = %task_id, previous = %status, "Task canceled");
        Ok(true)
    }

    fn resubmit(&self, task_id: TaskId) -> Result<(), TaskError> {
        {
            let mut inner = self.lock();
            let index = inner
                .position(task_id)
                .ok_or(TaskError::NotFound(task_id))?;
            inner.tasks[index].resubmit()?;

            // 重新排到队尾
            let task = inner.tasks.remove(index);
            inner.reporter.task_updated(&task);
            inner.tasks.push(task);
        }

        tracing::info!(task_id = %task_id, "Task resubmitted");
        self.wake_workers();
        Ok(())
    }

    fn get_task(&self, task_id: TaskId) -> Option<Task> {
        let inner = self.lock();
        inner.tasks.iter().find(|t| t.id() == task_id).cloned()
    }

    fn list_tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    fn system_state(&self) -> QueueSystemState {
        self.lock().snapshot()
    }

    fn claim_next(&self) -> Option<ClaimedTask> {
        let mut inner = self.lock();
        if !inner.is_processing || inner.is_paused {
            return None;
        }

        let index = inner
            .tasks
            .iter()
            .enumerate()
            // 上一次运行尚未交回结果的任务暂不认领
            .filter(|(_, t)| {
                t.status() == TaskStatus::Waiting && !self.tokens.contains_key(&t.id())
            })
            .min_by_key(|(_, t)| t.added_at())
            .map(|(index, _)| index)?;

        if let Err(e) = inner.tasks[index].start() {
            tracing::error!(error = %e, "Failed to start claimed task");
            return None;
        }

        let task = inner.tasks[index].clone();
        let cancel = CancellationToken::new();
        self.tokens.insert(task.id(), cancel.clone());
        inner.current_items.push(task.id());
        inner.reporter.task_updated(&task);

        tracing::debug!(task_id = %task.id(), "Task claimed");
        Some(ClaimedTask { task, cancel })
    }

    fn update_progress(&self, task_id: TaskId, progress: u8) {
        let mut inner = self.lock();
        let Ok(task) = inner.task_mut(task_id) else {
            return;
        };
        if task.advance_progress(progress) {
            let task = task.clone();
            inner.reporter.task_updated(&task);
        }
    }

    fn finish(&self, task_id: TaskId, resolution: TaskResolution) {
        let token = self.tokens.remove(&task_id).map(|(_, token)| token);
        let was_canceled = token.map(|t| t.is_cancelled()).unwrap_or(false);

        {
            let mut inner = self.lock();
            inner.release_slot(task_id);

            let Some(index) = inner.position(task_id) else {
                // 任务已被 clear 移除
                tracing::debug!(task_id = %task_id, "Finished task no longer in queue");
                drop(inner);
                self.wake_workers();
                return;
            };

            let task = &mut inner.tasks[index];
            if task.status() != TaskStatus::Processing {
                // 已被 cancel/stop 转为 Canceled，取消优先于任何结果
                tracing::debug!(
                    task_id = %task_id,
                    status = %task.status(),
                    "Ignoring result for task no longer processing"
                );
                drop(inner);
                self.wake_workers();
                return;
            }

            let resolution = if was_canceled {
                TaskResolution::Canceled
            } else {
                resolution
            };

            let outcome = match resolution {
                TaskResolution::Completed { output, analysis } => task.complete(output, analysis),
                TaskResolution::Error(message) => task.record_error(message),
                TaskResolution::QuotaDenied(reason) => task.record_quota_denied(reason),
                TaskResolution::Canceled => {
                    task.cancel(Some(CANCELED_REASON.to_string()));
                    Ok(())
                }
            };
            if let Err(e) = outcome {
                tracing::error!(task_id = %task_id, error = %e, "Failed to record task result");
            }

            let task = task.clone();
            inner.reporter.task_updated(&task);
            if task.status() == TaskStatus::Completed {
                inner
                    .reporter
                    .task_completed(task.processing_time_ms().unwrap_or(0));
            }

            tracing::info!(
                task_id = %task_id,
                status = %task.status(),
                processing_time_ms = ?task.processing_time_ms(),
                "Task finished"
            );
        }

        self.wake_workers();
    }

    fn work_notifier(&self) -> Arc<Notify> {
        self.notify.clone()
    }
}
