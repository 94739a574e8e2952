//! Generation Worker - Background Task Processor

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::pipeline::{ChunkedGenerator, PipelineError};
use crate::application::ports::{ClaimedTask, QuotaGatePort, TaskQueuePort, TaskResolution};

const TASK_QUOTA_UNITS: u64 = 1;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// 并发 Worker 数，每个 Worker 同时只处理一个任务
    pub workers: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// 生成 Worker 池
///
/// 后台任务处理器，从队列认领任务并执行分块生成。
/// 各 Worker 互不等待，单个任务的失败不影响其他 Worker
pub struct WorkerPool {
    config: WorkerPoolConfig,
    queue: Arc<dyn TaskQueuePort>,
    generator: Arc<ChunkedGenerator>,
    quota: Arc<dyn QuotaGatePort>,
    shutdown: CancellationToken,
}

impl WorkerPool {
    pub fn new(
        config: WorkerPoolConfig,
        queue: Arc<dyn TaskQueuePort>,
        generator: Arc<ChunkedGenerator>,
        quota: Arc<dyn QuotaGatePort>,
    ) -> Self {
        Self {
            config,
            queue,
            generator,
            quota,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 启动全部 Worker
    pub fn spawn(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let workers = self.config.workers.max(1);
        tracing::info!(workers = workers, "Worker pool started");

        (0..workers)
            .map(|worker_id| {
                let pool = self.clone();
                tokio::spawn(async move { pool.run_worker(worker_id).await })
            })
            .collect()
    }

    /// 通知所有 Worker 退出，进行中的任务按取消处理
    pub fn shutdown(&self) {
        tracing::info!("Worker pool shutting down");
        self.shutdown.cancel();
    }

    async fn run_worker(&self, worker_id: usize) {
        let notify = self.queue.work_notifier();
        tracing::debug!(worker_id = worker_id, "Worker started");

        loop {
            // 先登记等待再检查队列，避免错过两者之间的唤醒
            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.shutdown.is_cancelled() {
                break;
            }

            if let Some(claimed) = self.queue.claim_next() {
                self.process_task(worker_id, claimed).await;
                continue;
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = &mut notified => {}
            }
        }

        tracing::debug!(worker_id = worker_id, "Worker stopped");
    }

    /// 处理单个任务
    async fn process_task(&self, worker_id: usize, claimed: ClaimedTask) {
        let ClaimedTask { task, cancel } = claimed;
        let task_id = task.id();

        tracing::info!(
            worker_id = worker_id,
            task_id = %task_id,
            kind = task.kind().as_str(),
            target_size = task.settings().target_size,
            "Task processing started"
        );

        // Check 1: 配额，每个任务计 1 个单位
        match self.quota.admit(task.kind().as_str(), TASK_QUOTA_UNITS).await {
            Ok(decision) if decision.allowed => {}
            Ok(decision) => {
                let reason = decision
                    .reason
                    .unwrap_or_else(|| "Quota exceeded".to_string());
                tracing::warn!(task_id = %task_id, reason = %reason, "Quota denied");
                self.queue.finish(task_id, TaskResolution::QuotaDenied(reason));
                return;
            }
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "Quota check failed");
                self.queue.finish(task_id, TaskResolution::Error(e.to_string()));
                return;
            }
        }

        // 执行生成
        let queue = self.queue.clone();
        let on_progress = move |progress: u8| queue.update_progress(task_id, progress);

        // 关机时同时取消进行中的任务
        let result = tokio::select! {
            result = self.generator.run(&task, &cancel, on_progress) => result,
            _ = self.shutdown.cancelled() => {
                cancel.cancel();
                Err(PipelineError::Canceled)
            }
        };

        let resolution = match result {
            Ok(outcome) => {
                tracing::info!(
                    task_id = %task_id,
                    chunks = outcome.chunks,
                    normalized = outcome.normalized,
                    "Generation finished"
                );
                TaskResolution::Completed {
                    output: outcome.text,
                    analysis: outcome.analysis,
                }
            }
            Err(PipelineError::Canceled) => {
                tracing::info!(task_id = %task_id, "Generation canceled");
                TaskResolution::Canceled
            }
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "Generation failed");
                TaskResolution::Error(e.to_string())
            }
        };

        self.queue.finish(task_id, resolution);
    }
}
