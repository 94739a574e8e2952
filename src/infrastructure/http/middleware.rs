//! HTTP Middleware

use std::time::{Duration, Instant};

use axum::{extract::Request, middleware::Next, response::Response};

/// 超过该时长的请求记为慢请求
const SLOW_REQUEST: Duration = Duration::from_millis(500);

/// 请求日志中间件
///
/// 记录传输层失败（4xx/5xx）和慢请求。
/// 业务错误以 errno 形式返回 200，在 ApiError::into_response() 中记录
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        tracing::error!(%method, %uri, status, elapsed_ms, "HTTP server error");
    } else if response.status().is_client_error() {
        tracing::warn!(%method, %uri, status, elapsed_ms, "HTTP client error");
    } else if started.elapsed() >= SLOW_REQUEST {
        tracing::warn!(%method, %uri, status, elapsed_ms, "Slow HTTP request");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::{get, post},
        Router,
    };
    use tower::util::ServiceExt;

    use crate::infrastructure::http::ApiError;

    async fn unknown_task() -> Result<&'static str, ApiError> {
        Err(ApiError::NotFound("Task not found".to_string()))
    }

    fn create_test_router() -> Router {
        Router::new()
            .route("/task", get(unknown_task))
            .route("/enqueue", post(|| async { "queued" }))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    #[tokio::test]
    async fn test_business_error_passes_through_as_ok() {
        let request = HttpRequest::builder()
            .uri("/task")
            .body(Body::empty())
            .unwrap();

        let response = create_test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_method_is_client_error() {
        let request = HttpRequest::builder()
            .uri("/enqueue")
            .body(Body::empty())
            .unwrap();

        let response = create_test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let request = HttpRequest::builder()
            .uri("/missing")
            .body(Body::empty())
            .unwrap();

        let response = create_test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
