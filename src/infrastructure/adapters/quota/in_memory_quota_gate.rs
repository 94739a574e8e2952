//! In-Memory Quota Gate
//!
//! 按 action 计数的固定窗口配额

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::application::ports::{QuotaDecision, QuotaError, QuotaGatePort, QuotaUsage};

/// 单个 action 的窗口计数
#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    used: u64,
}

/// 固定窗口配额闸门
///
/// 每个 action 在 `window` 内最多消耗 `limit` 个单位，窗口到期后整体清零
pub struct InMemoryQuotaGate {
    limit: u64,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl InMemoryQuotaGate {
    pub fn new(limit: u64, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    /// 查询当前用量，不消耗配额
    pub fn usage(&self, action: &str) -> QuotaUsage {
        let now = Instant::now();
        let used = self
            .windows
            .get(action)
            .filter(|w| now.duration_since(w.started_at) < self.window)
            .map(|w| w.used)
            .unwrap_or(0);
        self.usage_from(used)
    }

    fn usage_from(&self, used: u64) -> QuotaUsage {
        QuotaUsage {
            current: used,
            limit: self.limit,
            remaining: self.limit.saturating_sub(used),
        }
    }
}

#[async_trait]
impl QuotaGatePort for InMemoryQuotaGate {
    async fn admit(&self, action: &str, units: u64) -> Result<QuotaDecision, QuotaError> {
        let now = Instant::now();
        let mut entry = self.windows.entry(action.to_string()).or_insert(Window {
            started_at: now,
            used: 0,
        });

        if now.duration_since(entry.started_at) >= self.window {
            *entry = Window {
                started_at: now,
                used: 0,
            };
        }

        let requested = entry.used.saturating_add(units);
        if requested > self.limit {
            let usage = self.usage_from(entry.used);
            tracing::debug!(
                action = %action,
                units = units,
                used = entry.used,
                limit = self.limit,
                "Quota denied"
            );
            return Ok(QuotaDecision::deny(
                format!(
                    "Quota exceeded for {}: {} of {} used, {} requested",
                    action, usage.current, usage.limit, units
                ),
                usage,
            ));
        }

        entry.used = requested;
        Ok(QuotaDecision::allow(self.usage_from(requested)))
    }
}

/// 不做任何限制的配额闸门
#[derive(Debug, Default)]
pub struct AllowAllQuotaGate;

#[async_trait]
impl QuotaGatePort for AllowAllQuotaGate {
    async fn admit(&self, _action: &str, units: u64) -> Result<QuotaDecision, QuotaError> {
        Ok(QuotaDecision::allow(QuotaUsage {
            current: units,
            limit: u64::MAX,
            remaining: u64::MAX.saturating_sub(units),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_admit_until_limit() {
        let gate = InMemoryQuotaGate::new(5000, Duration::from_secs(3600));

        let first = gate.admit("story", 3000).await.unwrap();
        assert!(first.allowed);
        assert_eq!(first.usage.remaining, 2000);

        let second = gate.admit("story", 3000).await.unwrap();
        assert!(!second.allowed);
        assert!(second.reason.unwrap().contains("story"));
        assert_eq!(second.usage.current, 3000);

        // 各 action 独立计数
        assert!(gate.admit("rewrite", 3000).await.unwrap().allowed);
        assert_eq!(gate.usage("story").current, 3000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets() {
        let gate = InMemoryQuotaGate::new(1000, Duration::from_secs(60));
        assert!(gate.admit("hook", 1000).await.unwrap().allowed);
        assert!(!gate.admit("hook", 1).await.unwrap().allowed);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(gate.usage("hook").current, 0);
        assert!(gate.admit("hook", 500).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_allow_all() {
        let decision = AllowAllQuotaGate.admit("story", 1_000_000).await.unwrap();
        assert!(decision.allowed);
        assert!(decision.reason.is_none());
    }
}
