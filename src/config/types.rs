//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::time::Duration;

use crate::application::pipeline::{ChunkingConfig, RetryPolicy};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 生成服务配置
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// 队列与重试配置
    #[serde(default)]
    pub queue: QueueConfig,

    /// 分块生成配置
    #[serde(default)]
    pub chunking: ChunkingSettings,

    /// 配额配置
    #[serde(default)]
    pub quota: QuotaConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 生成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// 生成服务基础 URL
    #[serde(default = "default_generator_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_generator_timeout")]
    pub timeout_secs: u64,

    /// Bearer Token
    #[serde(default)]
    pub api_key: Option<String>,

    /// 使用内置的 FakeGenerator，不访问外部服务
    #[serde(default)]
    pub fake: bool,
}

fn default_generator_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_generator_timeout() -> u64 {
    120
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            url: default_generator_url(),
            timeout_secs: default_generator_timeout(),
            api_key: None,
            fake: false,
        }
    }
}

/// 队列与重试配置
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// 并发 Worker 数
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// 每次上游调用的总尝试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// 单 Worker 时服务端故障的退避基数（毫秒）
    #[serde(default = "default_server_base_delay_ms")]
    pub server_base_delay_ms: u64,

    /// 多 Worker 时服务端故障的退避基数（毫秒）
    #[serde(default = "default_batch_server_base_delay_ms")]
    pub batch_server_base_delay_ms: u64,

    /// 上游过载的退避基数（毫秒）
    #[serde(default = "default_overload_base_delay_ms")]
    pub overload_base_delay_ms: u64,

    /// 块间节流延迟（毫秒）
    #[serde(default = "default_inter_chunk_delay_ms")]
    pub inter_chunk_delay_ms: u64,

    /// 启动后立即开始处理
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
}

fn default_workers() -> usize {
    1
}

fn default_max_retries() -> u32 {
    3
}

fn default_server_base_delay_ms() -> u64 {
    5000
}

fn default_batch_server_base_delay_ms() -> u64 {
    6000
}

fn default_overload_base_delay_ms() -> u64 {
    60_000
}

fn default_inter_chunk_delay_ms() -> u64 {
    1500
}

fn default_auto_start() -> bool {
    true
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_retries: default_max_retries(),
            server_base_delay_ms: default_server_base_delay_ms(),
            batch_server_base_delay_ms: default_batch_server_base_delay_ms(),
            overload_base_delay_ms: default_overload_base_delay_ms(),
            inter_chunk_delay_ms: default_inter_chunk_delay_ms(),
            auto_start: default_auto_start(),
        }
    }
}

impl QueueConfig {
    /// 多 Worker 时使用批量模式的退避基数
    pub fn retry_policy(&self) -> RetryPolicy {
        let server_base_delay = if self.workers > 1 {
            self.batch_server_base_delay_ms
        } else {
            self.server_base_delay_ms
        };
        RetryPolicy {
            max_retries: self.max_retries,
            server_base_delay: Duration::from_millis(server_base_delay),
            overload_base_delay: Duration::from_millis(self.overload_base_delay_ms),
        }
    }
}

/// 分块生成配置
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkingSettings {
    /// 单块规模
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// 前文窗口规模
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// 长度容差（0-1）
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// 分块阶段占用的进度百分比
    #[serde(default = "default_base_fraction")]
    pub base_fraction: u8,

    /// 是否执行长度修正
    #[serde(default = "default_normalize")]
    pub normalize: bool,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_context_window() -> usize {
    2000
}

fn default_tolerance() -> f64 {
    0.1
}

fn default_base_fraction() -> u8 {
    90
}

fn default_normalize() -> bool {
    true
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            context_window: default_context_window(),
            tolerance: default_tolerance(),
            base_fraction: default_base_fraction(),
            normalize: default_normalize(),
        }
    }
}

impl ChunkingSettings {
    pub fn to_chunking_config(&self, queue: &QueueConfig) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: self.chunk_size,
            context_window: self.context_window,
            tolerance: self.tolerance,
            base_fraction: self.base_fraction,
            inter_chunk_delay: Duration::from_millis(queue.inter_chunk_delay_ms),
            normalize: self.normalize,
        }
    }
}

/// 配额配置
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    /// 是否启用配额
    #[serde(default = "default_quota_enabled")]
    pub enabled: bool,

    /// 每个窗口每种任务类型的上限（任务数）
    #[serde(default = "default_quota_limit")]
    pub limit: u64,

    /// 窗口长度（秒）
    #[serde(default = "default_quota_window")]
    pub window_secs: u64,
}

fn default_quota_enabled() -> bool {
    true
}

fn default_quota_limit() -> u64 {
    100
}

fn default_quota_window() -> u64 {
    3600 // 1 小时
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            enabled: default_quota_enabled(),
            limit: default_quota_limit(),
            window_secs: default_quota_window(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5070);
        assert_eq!(config.generator.url, "http://localhost:8000");
        assert_eq!(config.queue.workers, 1);
        assert_eq!(config.queue.max_retries, 3);
        assert_eq!(config.chunking.chunk_size, 1000);
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:5070");
    }

    #[test]
    fn test_retry_policy_switches_to_batch_delay() {
        let mut queue = QueueConfig::default();
        assert_eq!(queue.retry_policy().server_base_delay, Duration::from_secs(5));

        queue.workers = 3;
        let policy = queue.retry_policy();
        assert_eq!(policy.server_base_delay, Duration::from_secs(6));
        assert_eq!(policy.overload_base_delay, Duration::from_secs(60));
        assert_eq!(policy.max_retries, 3);
    }

    #[test]
    fn test_chunking_config_conversion() {
        let chunking = ChunkingSettings::default().to_chunking_config(&QueueConfig::default());
        assert_eq!(chunking.context_window, 2000);
        assert_eq!(chunking.inter_chunk_delay, Duration::from_millis(1500));
        assert!(chunking.normalize);
    }
}
