//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::ports::{QueueStats, QueueSystemState};
use crate::domain::task::{
    GenerationSettings, QualityReport, Task, TaskId, TaskKind, TaskStatus,
};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(Empty {}),
        }
    }
}

// ============================================================================
// Task DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct EnqueueTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub kind: TaskKind,
    pub input: String,
    pub settings: GenerationSettings,
}

#[derive(Debug, Serialize)]
pub struct EnqueueTaskResponse {
    pub task_id: TaskId,
}

/// 只携带任务 ID 的请求（remove/cancel/resubmit/get）
#[derive(Debug, Deserialize)]
pub struct TaskIdRequest {
    pub task_id: TaskId,
}

#[derive(Debug, Deserialize)]
pub struct ListTasksParams {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CancelTaskResponseDto {
    pub task_id: TaskId,
    pub canceled: bool,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: TaskId,
    pub title: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub progress: u8,
    pub settings: GenerationSettings,
    pub output: Option<String>,
    pub analysis: Option<QualityReport>,
    pub error: Option<String>,
    pub added_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub processing_time_ms: Option<u64>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_string(),
            kind: task.kind(),
            status: task.status(),
            progress: task.progress(),
            settings: task.settings().clone(),
            output: task.output().map(str::to_string),
            analysis: task.analysis().cloned(),
            error: task.error().map(str::to_string),
            added_at: task.added_at().to_rfc3339(),
            started_at: task.started_at().map(|t| t.to_rfc3339()),
            completed_at: task.completed_at().map(|t| t.to_rfc3339()),
            processing_time_ms: task.processing_time_ms(),
        }
    }
}

/// 列表项不带全文
#[derive(Debug, Serialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub title: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub progress: u8,
    pub error: Option<String>,
    pub added_at: String,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_string(),
            kind: task.kind(),
            status: task.status(),
            progress: task.progress(),
            error: task.error().map(str::to_string),
            added_at: task.added_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub total: usize,
    pub tasks: Vec<TaskSummary>,
}

// ============================================================================
// Queue DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct QueueStateResponse {
    pub is_enabled: bool,
    pub is_paused: bool,
    pub is_processing: bool,
    pub current_items: Vec<TaskId>,
    pub stats: QueueStats,
}

impl From<QueueSystemState> for QueueStateResponse {
    fn from(state: QueueSystemState) -> Self {
        Self {
            is_enabled: state.is_enabled,
            is_paused: state.is_paused,
            is_processing: state.is_processing,
            current_items: state.current_items,
            stats: state.stats,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StopQueueResponse {
    pub canceled: usize,
    pub state: QueueStateResponse,
}
