//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "QUILL";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `QUILL_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `QUILL_SERVER__PORT=8080`
/// - `QUILL_GENERATOR__URL=http://llm-gateway:8000`
/// - `QUILL_QUEUE__WORKERS=3`
/// - `QUILL_QUOTA__ENABLED=false`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("generator.url", "http://localhost:8000")?
        .set_default("generator.timeout_secs", 120)?
        .set_default("generator.fake", false)?
        .set_default("queue.workers", 1)?
        .set_default("queue.max_retries", 3)?
        .set_default("queue.server_base_delay_ms", 5000)?
        .set_default("queue.batch_server_base_delay_ms", 6000)?
        .set_default("queue.overload_base_delay_ms", 60_000)?
        .set_default("queue.inter_chunk_delay_ms", 1500)?
        .set_default("queue.auto_start", true)?
        .set_default("chunking.chunk_size", 1000)?
        .set_default("chunking.context_window", 2000)?
        .set_default("chunking.tolerance", 0.1)?
        .set_default("chunking.base_fraction", 90)?
        .set_default("chunking.normalize", true)?
        .set_default("quota.enabled", true)?
        .set_default("quota.limit", 100)?
        .set_default("quota.window_secs", 3600)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 例如: QUILL_GENERATOR__URL=http://llm-gateway:8000
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if !config.generator.fake && config.generator.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Generator URL cannot be empty".to_string(),
        ));
    }

    if config.queue.workers == 0 {
        return Err(ConfigError::ValidationError(
            "Worker count must be at least 1".to_string(),
        ));
    }

    if config.queue.max_retries == 0 {
        return Err(ConfigError::ValidationError(
            "max_retries must be at least 1".to_string(),
        ));
    }

    if config.chunking.chunk_size == 0 {
        return Err(ConfigError::ValidationError(
            "Chunk size cannot be 0".to_string(),
        ));
    }

    let tolerance = config.chunking.tolerance;
    if !(tolerance > 0.0 && tolerance < 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "Length tolerance must be between 0 and 1, got {}",
            tolerance
        )));
    }

    if !(1..=99).contains(&config.chunking.base_fraction) {
        return Err(ConfigError::ValidationError(format!(
            "base_fraction must be between 1 and 99, got {}",
            config.chunking.base_fraction
        )));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    if config.generator.fake {
        tracing::info!("Generator: fake");
    } else {
        tracing::info!("Generator URL: {}", config.generator.url);
        tracing::info!("Generator Timeout: {}s", config.generator.timeout_secs);
    }
    tracing::info!("Workers: {}", config.queue.workers);
    tracing::info!("Max Attempts: {}", config.queue.max_retries);
    tracing::info!("Auto Start: {}", config.queue.auto_start);
    tracing::info!(
        "Chunking: size={} window={} tolerance={}",
        config.chunking.chunk_size,
        config.chunking.context_window,
        config.chunking.tolerance
    );
    tracing::info!("Quota Enabled: {}", config.quota.enabled);
    if config.quota.enabled {
        tracing::info!(
            "Quota: {} per {}s",
            config.quota.limit,
            config.quota.window_secs
        );
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_generator_url() {
        let mut config = AppConfig::default();
        config.generator.url = String::new();
        assert!(validate_config(&config).is_err());

        config.generator.fake = true;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_workers() {
        let mut config = AppConfig::default();
        config.queue.workers = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_attempts() {
        let mut config = AppConfig::default();
        config.queue.max_retries = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_bad_tolerance() {
        let mut config = AppConfig::default();
        config.chunking.tolerance = 1.5;
        assert!(validate_config(&config).is_err());
        config.chunking.tolerance = 0.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_bad_base_fraction() {
        let mut config = AppConfig::default();
        config.chunking.base_fraction = 100;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090

[generator]
fake = true

[queue]
workers = 3
inter_chunk_delay_ms = 0

[chunking]
chunk_size = 500
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9090);
        assert!(config.generator.fake);
        assert_eq!(config.queue.workers, 3);
        assert_eq!(config.queue.inter_chunk_delay_ms, 0);
        assert_eq!(config.chunking.chunk_size, 500);
        // 未出现的字段保持默认值
        assert_eq!(config.chunking.context_window, 2000);
        assert_eq!(config.quota.limit, 100);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[queue]\nworkers = 0").unwrap();

        let err = load_config_from_path(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
