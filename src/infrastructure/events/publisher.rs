//! Event Publisher Implementation
//!
//! 引擎事件推送：全局频道 + 按任务订阅的频道

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::{QueueStats, QueueSystemState};
use crate::domain::task::{Task, TaskId, TaskStatus};

/// 频道容量
const CHANNEL_CAPACITY: usize = 256;

/// 引擎事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum EngineEvent {
    /// 任务状态或进度变更
    TaskUpdated {
        task_id: TaskId,
        status: TaskStatus,
        progress: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// 任务被移出队列
    TaskRemoved { task_id: TaskId },
    /// 队列统计变更
    QueueStatsUpdated {
        completed_count: usize,
        total_count: usize,
        average_processing_time_ms: f64,
    },
    /// 队列启停/暂停状态变更
    QueueStateChanged { is_processing: bool, is_paused: bool },
}

impl EngineEvent {
    pub fn task_updated(task: &Task) -> Self {
        EngineEvent::TaskUpdated {
            task_id: task.id(),
            status: task.status(),
            progress: task.progress(),
            output: task.output().map(str::to_string),
            error: task.error().map(str::to_string),
        }
    }

    /// 事件关联的任务
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            EngineEvent::TaskUpdated { task_id, .. } | EngineEvent::TaskRemoved { task_id } => {
                Some(*task_id)
            }
            _ => None,
        }
    }
}

/// 事件发布器
pub struct EventPublisher {
    /// task_id -> broadcast sender (单任务订阅)
    task_channels: DashMap<TaskId, broadcast::Sender<EngineEvent>>,
    /// 全局频道，所有事件都会发送到这里
    global_channel: broadcast::Sender<EngineEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            task_channels: DashMap::new(),
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全部事件
    pub fn subscribe_global(&self) -> broadcast::Receiver<EngineEvent> {
        self.global_channel.subscribe()
    }

    /// 订阅单个任务的事件
    pub fn subscribe_task(&self, task_id: TaskId) -> broadcast::Receiver<EngineEvent> {
        self.task_channels
            .entry(task_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 取消注册任务频道
    pub fn unregister_task(&self, task_id: TaskId) {
        self.task_channels.remove(&task_id);
    }

    /// 发布任务变更事件
    pub fn publish_task_updated(&self, task: &Task) {
        self.publish(EngineEvent::task_updated(task));
    }

    /// 发布任务移除事件，并关闭该任务的频道
    pub fn publish_task_removed(&self, task_id: TaskId) {
        self.publish(EngineEvent::TaskRemoved { task_id });
        self.unregister_task(task_id);
    }

    /// 发布统计事件
    pub fn publish_stats(&self, stats: &QueueStats) {
        self.publish(EngineEvent::QueueStatsUpdated {
            completed_count: stats.completed_count,
            total_count: stats.total_count,
            average_processing_time_ms: stats.average_processing_time_ms,
        });
    }

    /// 发布队列状态事件
    pub fn publish_queue_state(&self, state: &QueueSystemState) {
        self.publish(EngineEvent::QueueStateChanged {
            is_processing: state.is_processing,
            is_paused: state.is_paused,
        });
    }

    fn publish(&self, event: EngineEvent) {
        if let Some(task_id) = event.task_id() {
            if let Some(sender) = self.task_channels.get(&task_id) {
                if let Err(e) = sender.send(event.clone()) {
                    tracing::debug!(
                        task_id = %task_id,
                        error = %e,
                        "Failed to publish task event (no receivers)"
                    );
                }
            }
        }

        if let Err(e) = self.global_channel.send(event) {
            tracing::trace!(error = %e, "Failed to publish event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
