//! Task Handlers

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::application::{CancelTask, EnqueueTask, GetTask, ListTasks, RemoveTask, ResubmitTask};
use crate::domain::task::TaskStatus;
use crate::infrastructure::http::dto::{
    ApiResponse, CancelTaskResponseDto, Empty, EnqueueTaskRequest, EnqueueTaskResponse,
    ListTasksParams, TaskIdRequest, TaskListResponse, TaskResponse, TaskSummary,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Enqueue
// ============================================================================

pub async fn enqueue_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EnqueueTaskRequest>,
) -> Result<Json<ApiResponse<EnqueueTaskResponse>>, ApiError> {
    let cmd = EnqueueTask {
        title: req.title,
        kind: req.kind,
        input: req.input,
        settings: req.settings,
    };

    let task_id = state.enqueue_task_handler.handle(cmd)?;

    Ok(Json(ApiResponse::success(EnqueueTaskResponse { task_id })))
}

// ============================================================================
// Remove / Cancel / Resubmit
// ============================================================================

pub async fn remove_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TaskIdRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.remove_task_handler.handle(RemoveTask {
        task_id: req.task_id,
    })?;
    Ok(Json(ApiResponse::ok()))
}

pub async fn cancel_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TaskIdRequest>,
) -> Result<Json<ApiResponse<CancelTaskResponseDto>>, ApiError> {
    let result = state.cancel_task_handler.handle(CancelTask {
        task_id: req.task_id,
    })?;

    Ok(Json(ApiResponse::success(CancelTaskResponseDto {
        task_id: req.task_id,
        canceled: result.canceled,
    })))
}

pub async fn resubmit_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TaskIdRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.resubmit_task_handler.handle(ResubmitTask {
        task_id: req.task_id,
    })?;
    Ok(Json(ApiResponse::ok()))
}

// ============================================================================
// Queries
// ============================================================================

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TaskIdRequest>,
) -> Result<Json<ApiResponse<TaskResponse>>, ApiError> {
    let task = state.get_task_handler.handle(GetTask {
        task_id: req.task_id,
    })?;
    Ok(Json(ApiResponse::success(TaskResponse::from(task))))
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTasksParams>,
) -> Result<Json<ApiResponse<TaskListResponse>>, ApiError> {
    let status = match params.status.as_deref() {
        Some(raw) => Some(
            TaskStatus::from_str(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown task status: {}", raw)))?,
        ),
        None => None,
    };

    let tasks = state.list_tasks_handler.handle(ListTasks { status });

    Ok(Json(ApiResponse::success(TaskListResponse {
        total: tasks.len(),
        tasks: tasks.iter().map(TaskSummary::from).collect(),
    })))
}
