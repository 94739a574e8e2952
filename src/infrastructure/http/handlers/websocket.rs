//! WebSocket Handler
//!
//! - /ws/events: 全部引擎事件
//! - /ws/task/:task_id: 单个任务的事件

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::domain::task::TaskId;
use crate::infrastructure::events::EngineEvent;
use crate::infrastructure::http::state::AppState;

/// 单任务 WebSocket 连接处理
pub async fn task_websocket_handler(
    ws: WebSocketUpgrade,
    Path(task_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let task_id = TaskId::from_uuid(task_id);
    ws.on_upgrade(move |socket| handle_task_socket(socket, task_id, state))
}

/// 全局 WebSocket 连接处理
pub async fn global_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_global_socket(socket, state))
}

/// 订阅任务频道并取当前快照
///
/// 先订阅再取快照，快照之后的变更一定会出现在频道里（可能与快照重复）
fn subscribe_with_snapshot(
    state: &AppState,
    task_id: TaskId,
) -> Option<(broadcast::Receiver<EngineEvent>, EngineEvent)> {
    state.queue.get_task(task_id)?;

    let event_rx = state.event_publisher.subscribe_task(task_id);
    match state.queue.get_task(task_id) {
        Some(task) => Some((event_rx, EngineEvent::task_updated(&task))),
        None => {
            // 订阅期间任务已被移除，丢弃刚建立的频道
            drop(event_rx);
            state.event_publisher.unregister_task(task_id);
            None
        }
    }
}

async fn handle_task_socket(socket: WebSocket, task_id: TaskId, state: Arc<AppState>) {
    let (mut sender, receiver) = socket.split();

    let Some((event_rx, snapshot)) = subscribe_with_snapshot(&state, task_id) else {
        tracing::warn!(task_id = %task_id, "WebSocket connection rejected: unknown task");
        let _ = sender.close().await;
        return;
    };

    tracing::info!(task_id = %task_id, "Task WebSocket connected");
    pump(sender, receiver, event_rx, Some(snapshot), &task_id.to_string(), true).await;
    tracing::info!(task_id = %task_id, "Task WebSocket disconnected");
}

async fn handle_global_socket(socket: WebSocket, state: Arc<AppState>) {
    let event_rx = state.event_publisher.subscribe_global();
    let (sender, receiver) = socket.split();
    tracing::info!("Global WebSocket connected");

    pump(sender, receiver, event_rx, None, "global", false).await;

    tracing::info!("Global WebSocket disconnected");
}

/// 转发事件直到任一方向结束，另一方向随之终止
async fn pump<S, R>(
    mut sender: S,
    mut receiver: R,
    mut event_rx: broadcast::Receiver<EngineEvent>,
    initial: Option<EngineEvent>,
    label: &str,
    close_on_remove: bool,
) where
    S: Sink<Message, Error = axum::Error> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin + Send + 'static,
{
    let label_for_forward = label.to_string();
    let label_for_receive = label.to_string();

    // 事件转发任务
    let mut forward_task = tokio::spawn(async move {
        if let Some(event) = initial {
            if send_event(&mut sender, &event).await.is_err() {
                return;
            }
        }

        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        channel = %label_for_forward,
                        skipped = skipped,
                        "WebSocket subscriber lagged, events dropped"
                    );
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if let Err(e) = send_event(&mut sender, &event).await {
                tracing::debug!(
                    channel = %label_for_forward,
                    error = %e,
                    "Failed to send WebSocket message"
                );
                break;
            }

            // 任务被移除后不会再有事件
            if close_on_remove && matches!(event, EngineEvent::TaskRemoved { .. }) {
                break;
            }
        }
    });

    // 接收客户端消息（心跳）
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::debug!(channel = %label_for_receive, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(channel = %label_for_receive, error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    // 任一方向结束后中止另一方向，释放订阅和 socket
    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }
}

async fn send_event<S>(sender: &mut S, event: &EngineEvent) -> Result<(), axum::Error>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize event");
            return Ok(());
        }
    };
    sender.send(Message::Text(json)).await
}
