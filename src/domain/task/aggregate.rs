//! Task Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GenerationSettings, QualityReport, TaskError, TaskId, TaskKind, TaskStatus};

/// Task 聚合根
///
/// 不变量:
/// - id 与 settings 创建后不可变
/// - output 有值当且仅当 status == Completed
/// - Processing 期间 progress 单调不减
/// - 进入终态时记录 completed_at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    kind: TaskKind,
    input: String,
    settings: GenerationSettings,
    status: TaskStatus,
    progress: u8,
    output: Option<String>,
    analysis: Option<QualityReport>,
    error: Option<String>,
    added_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// 创建等待中的任务
    pub fn new(
        title: impl Into<String>,
        kind: TaskKind,
        input: impl Into<String>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            id: TaskId::new(),
            title: title.into(),
            kind,
            input: input.into(),
            settings,
            status: TaskStatus::Waiting,
            progress: 0,
            output: None,
            analysis: None,
            error: None,
            added_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Waiting -> Processing
    pub fn start(&mut self) -> Result<(), TaskError> {
        self.expect_status(TaskStatus::Waiting, "start")?;
        self.status = TaskStatus::Processing;
        self.progress = 0;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// 推进进度，只接受更大的值，返回是否发生变化
    pub fn advance_progress(&mut self, progress: u8) -> bool {
        if self.status != TaskStatus::Processing {
            return false;
        }
        let progress = progress.min(100);
        if progress <= self.progress {
            return false;
        }
        self.progress = progress;
        true
    }

    /// Processing -> Completed
    pub fn complete(
        &mut self,
        output: String,
        analysis: Option<QualityReport>,
    ) -> Result<(), TaskError> {
        self.expect_status(TaskStatus::Processing, "complete")?;
        self.status = TaskStatus::Completed;
        self.progress = 100;
        self.output = Some(output);
        self.analysis = analysis;
        self.error = None;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Processing -> Error
    pub fn record_error(&mut self, message: impl Into<String>) -> Result<(), TaskError> {
        self.expect_status(TaskStatus::Processing, "record_error")?;
        self.status = TaskStatus::Error;
        self.error = Some(message.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Processing -> Failed（配额拒绝）
    pub fn record_quota_denied(&mut self, reason: impl Into<String>) -> Result<(), TaskError> {
        self.expect_status(TaskStatus::Processing, "record_quota_denied")?;
        self.status = TaskStatus::Failed;
        self.error = Some(reason.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Waiting | Processing -> Canceled
    ///
    /// 对终态任务是空操作，返回 false
    pub fn cancel(&mut self, reason: Option<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Canceled;
        self.output = None;
        self.error = reason;
        self.completed_at = Some(Utc::now());
        true
    }

    /// Error | Canceled -> Waiting
    ///
    /// 重新排到队尾，清空上一次运行留下的进度和错误
    pub fn resubmit(&mut self) -> Result<(), TaskError> {
        if !self.status.can_resubmit() {
            return Err(TaskError::invalid_transition(self.id, self.status, "resubmit"));
        }
        self.status = TaskStatus::Waiting;
        self.progress = 0;
        self.output = None;
        self.analysis = None;
        self.error = None;
        self.added_at = Utc::now();
        self.started_at = None;
        self.completed_at = None;
        Ok(())
    }

    /// 本次运行耗时（毫秒），仅在已开始且已结束时有值
    pub fn processing_time_ms(&self) -> Option<u64> {
        let started = self.started_at?;
        let completed = self.completed_at?;
        Some((completed - started).num_milliseconds().max(0) as u64)
    }

    fn expect_status(&self, expected: TaskStatus, action: &'static str) -> Result<(), TaskError> {
        if self.status != expected {
            return Err(TaskError::invalid_transition(self.id, self.status, action));
        }
        Ok(())
    }

    // Getters
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn analysis(&self) -> Option<&QualityReport> {
        self.analysis.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}
