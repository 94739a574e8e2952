//! Progress Reporter - 队列统计聚合
//!
//! 只在队列的互斥锁内被调用，所有 Worker 的统计更新都经过这一条写入路径

use std::sync::Arc;

use super::EventPublisher;
use crate::application::ports::QueueStats;
use crate::domain::task::{Task, TaskStatus};

/// 进度与统计汇报器
pub struct ProgressReporter {
    stats: QueueStats,
    /// 计入平均值的完成样本数（移除已完成任务不会回退平均值）
    samples: u64,
    events: Arc<EventPublisher>,
}

impl ProgressReporter {
    pub fn new(events: Arc<EventPublisher>) -> Self {
        Self {
            stats: QueueStats::default(),
            samples: 0,
            events,
        }
    }

    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    pub fn events(&self) -> &Arc<EventPublisher> {
        &self.events
    }

    /// 新任务入队
    pub fn task_added(&mut self) {
        self.stats.total_count += 1;
        self.publish_stats();
    }

    /// 任务完成，更新完成数和滚动平均耗时
    pub fn task_completed(&mut self, processing_time_ms: u64) {
        self.stats.completed_count += 1;
        self.samples += 1;
        let delta = processing_time_ms as f64 - self.stats.average_processing_time_ms;
        self.stats.average_processing_time_ms += delta / self.samples as f64;
        self.publish_stats();
    }

    /// 任务被移出队列
    pub fn task_removed(&mut self, status: TaskStatus) {
        self.stats.total_count = self.stats.total_count.saturating_sub(1);
        if status == TaskStatus::Completed {
            self.stats.completed_count = self.stats.completed_count.saturating_sub(1);
        }
        self.publish_stats();
    }

    /// 清空统计
    pub fn reset(&mut self) {
        self.stats = QueueStats::default();
        self.samples = 0;
        self.publish_stats();
    }

    /// 推送单个任务的最新状态
    pub fn task_updated(&self, task: &Task) {
        self.events.publish_task_updated(task);
    }

    fn publish_stats(&self) {
        self.events.publish_stats(&self.stats);
    }
}

/// 检查队列不变量:
/// completed + |{Error,Canceled,Failed}| + |{Waiting,Processing}| == total
pub fn stats_consistent(tasks: &[Task], stats: &QueueStats) -> bool {
    let completed = tasks
        .iter()
        .filter(|t| t.status() == TaskStatus::Completed)
        .count();
    let others = tasks.len() - completed;
    completed == stats.completed_count && completed + others == stats.total_count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_mean() {
        let mut reporter = ProgressReporter::new(EventPublisher::new().arc());
        reporter.task_added();
        reporter.task_added();
        reporter.task_added();

        reporter.task_completed(1000);
        reporter.task_completed(3000);
        reporter.task_completed(2000);

        let stats = reporter.stats();
        assert_eq!(stats.completed_count, 3);
        assert_eq!(stats.total_count, 3);
        assert!((stats.average_processing_time_ms - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remove_completed_keeps_average() {
        let mut reporter = ProgressReporter::new(EventPublisher::new().arc());
        reporter.task_added();
        reporter.task_completed(1500);
        reporter.task_removed(TaskStatus::Completed);

        let stats = reporter.stats();
        assert_eq!(stats.completed_count, 0);
        assert_eq!(stats.total_count, 0);
        assert!((stats.average_processing_time_ms - 1500.0).abs() < f64::EPSILON);

        reporter.reset();
        assert_eq!(reporter.stats(), QueueStats::default());
    }

    #[tokio::test]
    async fn test_stats_events_published() {
        let events = EventPublisher::new().arc();
        let mut rx = events.subscribe_global();
        let mut reporter = ProgressReporter::new(events);

        reporter.task_added();

        match rx.recv().await.unwrap() {
            super::super::EngineEvent::QueueStatsUpdated { total_count, .. } => {
                assert_eq!(total_count, 1)
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
