//! Queue Control Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{ClearQueue, GetQueueState, QueueControl};
use crate::infrastructure::http::dto::{ApiResponse, QueueStateResponse, StopQueueResponse};
use crate::infrastructure::http::state::AppState;

fn control(state: &AppState, command: QueueControl) -> Json<ApiResponse<QueueStateResponse>> {
    let result = state.queue_control_handler.handle(command);
    Json(ApiResponse::success(QueueStateResponse::from(result.state)))
}

pub async fn start_queue(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<QueueStateResponse>> {
    control(&state, QueueControl::Start)
}

pub async fn pause_queue(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<QueueStateResponse>> {
    control(&state, QueueControl::Pause)
}

pub async fn resume_queue(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<QueueStateResponse>> {
    control(&state, QueueControl::Resume)
}

pub async fn stop_queue(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<StopQueueResponse>> {
    let result = state.queue_control_handler.handle(QueueControl::Stop);
    Json(ApiResponse::success(StopQueueResponse {
        canceled: result.canceled,
        state: QueueStateResponse::from(result.state),
    }))
}

pub async fn clear_queue(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<QueueStateResponse>> {
    let queue_state = state.clear_queue_handler.handle(ClearQueue);
    Json(ApiResponse::success(QueueStateResponse::from(queue_state)))
}

pub async fn queue_stats(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<QueueStateResponse>> {
    let queue_state = state.get_queue_state_handler.handle(GetQueueState);
    Json(ApiResponse::success(QueueStateResponse::from(queue_state)))
}
