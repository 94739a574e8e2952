//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping               GET   健康检查
//! - /api/task/enqueue       POST  提交生成任务
//! - /api/task/remove        POST  移除任务（Processing 任务需先取消）
//! - /api/task/cancel        POST  取消任务
//! - /api/task/resubmit      POST  重新提交 Error/Canceled 任务
//! - /api/task/get           POST  获取任务详情（含全文）
//! - /api/task/list          GET   列出任务（?status= 过滤）
//! - /api/queue/start        POST  开始处理
//! - /api/queue/pause        POST  暂停认领
//! - /api/queue/resume       POST  恢复认领
//! - /api/queue/stop         POST  取消全部并停止
//! - /api/queue/clear        POST  清空队列
//! - /api/queue/stats        GET   队列状态与统计
//! - /ws/events              WS    全局事件
//! - /ws/task/{id}           WS    单任务事件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/task/:task_id", get(handlers::task_websocket_handler))
        .route("/ws/events", get(handlers::global_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/task", task_routes())
        .nest("/queue", queue_routes())
}

/// Task 路由
fn task_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/enqueue", post(handlers::enqueue_task))
        .route("/remove", post(handlers::remove_task))
        .route("/cancel", post(handlers::cancel_task))
        .route("/resubmit", post(handlers::resubmit_task))
        .route("/get", post(handlers::get_task))
        .route("/list", get(handlers::list_tasks))
}

/// Queue 路由
fn queue_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start", post(handlers::start_queue))
        .route("/pause", post(handlers::pause_queue))
        .route("/resume", post(handlers::resume_queue))
        .route("/stop", post(handlers::stop_queue))
        .route("/clear", post(handlers::clear_queue))
        .route("/stats", get(handlers::queue_stats))
}
