//! Retry Executor - 上游调用的分类重试
//!
//! - 容量/限流类错误：长基数指数退避
//! - 服务端故障：短基数指数退避
//! - 其他错误：立即失败
//!
//! 所有退避等待都与任务的取消令牌竞争

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::PipelineError;
use crate::application::ports::GeneratorError;

/// 默认最大尝试次数
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// 单任务模式下服务端故障的退避基数
pub const DEFAULT_SERVER_BASE_DELAY: Duration = Duration::from_secs(5);

/// 上游过载的退避基数
pub const DEFAULT_OVERLOAD_BASE_DELAY: Duration = Duration::from_secs(60);

const OVERLOAD_MARKERS: &[&str] = &[
    "overloaded",
    "rate limit",
    "rate_limit",
    "too many requests",
    "capacity",
];

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 上游饱和，长退避后重试
    TransientOverload,
    /// 一般服务端故障，短退避后重试
    TransientServer,
    /// 不重试
    Permanent,
}

impl ErrorClass {
    pub fn classify(error: &GeneratorError) -> Self {
        match error {
            GeneratorError::Overloaded(_) => ErrorClass::TransientOverload,
            GeneratorError::ServiceError(message) => {
                let lower = message.to_lowercase();
                if OVERLOAD_MARKERS.iter().any(|m| lower.contains(m)) {
                    ErrorClass::TransientOverload
                } else {
                    ErrorClass::TransientServer
                }
            }
            GeneratorError::Timeout | GeneratorError::NetworkError(_) => {
                ErrorClass::TransientServer
            }
            GeneratorError::Rejected(_) | GeneratorError::InvalidResponse(_) => {
                ErrorClass::Permanent
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorClass::Permanent)
    }
}

/// 重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 总尝试次数（包含首次）
    pub max_retries: u32,
    pub server_base_delay: Duration,
    pub overload_base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            server_base_delay: DEFAULT_SERVER_BASE_DELAY,
            overload_base_delay: DEFAULT_OVERLOAD_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// 第 attempt 次失败（从 0 开始）后的等待时长: base * 2^attempt
    pub fn backoff(&self, class: ErrorClass, attempt: u32) -> Duration {
        let base = match class {
            ErrorClass::TransientOverload => self.overload_base_delay,
            ErrorClass::TransientServer => self.server_base_delay,
            ErrorClass::Permanent => return Duration::ZERO,
        };
        base.saturating_mul(1u32 << attempt.min(16))
    }
}

/// 可被取消的等待
pub async fn cancellable_sleep(
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Canceled);
    }
    if duration.is_zero() {
        return Ok(());
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Canceled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// 重试执行器
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// 执行一次上游调用，按错误分类重试
    ///
    /// 调用本身和每次退避都与 `cancel` 竞争，取消时立即返回 `PipelineError::Canceled`
    pub async fn execute<T, F, Fut>(
        &self,
        operation: &str,
        cancel: &CancellationToken,
        mut call: F,
    ) -> Result<T, PipelineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GeneratorError>>,
    {
        let max_attempts = self.policy.max_retries.max(1);
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(PipelineError::Canceled);
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PipelineError::Canceled),
                result = call() => result,
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            attempt += 1;
            let class = ErrorClass::classify(&error);

            if !class.is_retryable() {
                tracing::warn!(
                    operation = %operation,
                    attempt = attempt,
                    error = %error,
                    "Permanent upstream error, not retrying"
                );
                return Err(PipelineError::Permanent(error.to_string()));
            }

            if attempt >= max_attempts {
                tracing::warn!(
                    operation = %operation,
                    attempts = attempt,
                    error = %error,
                    "Retries exhausted"
                );
                return Err(PipelineError::Exhausted {
                    attempts: attempt,
                    message: error.to_string(),
                });
            }

            let delay = self.policy.backoff(class, attempt - 1);
            tracing::warn!(
                operation = %operation,
                attempt = attempt,
                class = ?class,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient upstream error, backing off"
            );
            cancellable_sleep(delay, cancel).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn executor() -> RetryExecutor {
        RetryExecutor::new(RetryPolicy::default())
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            ErrorClass::classify(&GeneratorError::Overloaded("529".into())),
            ErrorClass::TransientOverload
        );
        assert_eq!(
            ErrorClass::classify(&GeneratorError::ServiceError("Rate limit exceeded".into())),
            ErrorClass::TransientOverload
        );
        assert_eq!(
            ErrorClass::classify(&GeneratorError::ServiceError("HTTP 502".into())),
            ErrorClass::TransientServer
        );
        assert_eq!(
            ErrorClass::classify(&GeneratorError::Timeout),
            ErrorClass::TransientServer
        );
        assert_eq!(
            ErrorClass::classify(&GeneratorError::Rejected("invalid api key".into())),
            ErrorClass::Permanent
        );
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.backoff(ErrorClass::TransientServer, 0),
            Duration::from_secs(5)
        );
        assert_eq!(
            policy.backoff(ErrorClass::TransientServer, 2),
            Duration::from_secs(20)
        );
        assert_eq!(
            policy.backoff(ErrorClass::TransientOverload, 1),
            Duration::from_secs(120)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_transient_makes_max_attempts() {
        let attempts = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let counter = attempts.clone();
        let result: Result<(), _> = executor()
            .execute("chunk", &cancel, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(GeneratorError::ServiceError("HTTP 500: boom".into()))
                }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(
            result,
            Err(PipelineError::Exhausted {
                attempts: 3,
                message: "Service error: HTTP 500: boom".into()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_makes_one_attempt() {
        let attempts = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let counter = attempts.clone();
        let result: Result<(), _> = executor()
            .execute("chunk", &cancel, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(GeneratorError::Rejected("content policy".into()))
                }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(PipelineError::Permanent(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient() {
        let attempts = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let counter = attempts.clone();
        let result = executor()
            .execute("chunk", &cancel, || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(GeneratorError::Overloaded("busy".into()))
                    } else {
                        Ok("text")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("text"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let attempts = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let counter = attempts.clone();
        let started = tokio::time::Instant::now();
        let result: Result<(), _> = executor()
            .execute("chunk", &cancel, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(GeneratorError::Overloaded("busy".into()))
                }
            })
            .await;

        assert_eq!(result, Err(PipelineError::Canceled));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        // 没有等满 60s 的过载退避
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_already_canceled_skips_call() {
        let attempts = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let counter = attempts.clone();
        let result: Result<(), _> = executor()
            .execute("chunk", &cancel, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;
        assert_eq!(result, Err(PipelineError::Canceled));
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }
}
