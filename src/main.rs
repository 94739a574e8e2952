//! Quill - 长文本分块生成队列引擎
//!
//! - Domain: task/, chunk_plan
//! - Application: pipeline, commands, queries, ports
//! - Infrastructure: http, memory, worker, adapters, events

use std::sync::Arc;
use std::time::Duration;

use quill::application::pipeline::{ChunkedGenerator, RetryExecutor, StrategyRegistry};
use quill::application::ports::{GeneratorPort, QuotaGatePort, TaskQueuePort};
use quill::config::{load_config, print_config, LogConfig};
use quill::infrastructure::adapters::{
    AllowAllQuotaGate, FakeGenerator, HttpGenerator, HttpGeneratorConfig, InMemoryQuotaGate,
};
use quill::infrastructure::events::EventPublisher;
use quill::infrastructure::http::{AppState, HttpServer};
use quill::infrastructure::memory::InMemoryTaskQueue;
use quill::infrastructure::worker::{WorkerPool, WorkerPoolConfig};

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},quill={},tower_http=debug", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Quill - 长文本分块生成队列引擎");
    print_config(&config);

    // 创建生成引擎
    let generator: Arc<dyn GeneratorPort> = if config.generator.fake {
        Arc::new(FakeGenerator::with_defaults())
    } else {
        let generator_config = HttpGeneratorConfig::new(&config.generator.url)
            .with_timeout(config.generator.timeout_secs)
            .with_api_key(config.generator.api_key.clone());
        Arc::new(HttpGenerator::new(generator_config)?)
    };

    if !generator.health_check().await {
        tracing::warn!("Generator health check failed, tasks will retry on demand");
    }

    // 创建配额闸门
    let quota: Arc<dyn QuotaGatePort> = if config.quota.enabled {
        Arc::new(InMemoryQuotaGate::new(
            config.quota.limit,
            Duration::from_secs(config.quota.window_secs),
        ))
    } else {
        Arc::new(AllowAllQuotaGate)
    };

    // 创建事件发布器和任务队列
    let event_publisher = EventPublisher::new().arc();
    let queue: Arc<dyn TaskQueuePort> = InMemoryTaskQueue::new(event_publisher.clone()).arc();

    // 创建分块生成器
    let chunked_generator = Arc::new(ChunkedGenerator::new(
        generator,
        StrategyRegistry::with_defaults(),
        RetryExecutor::new(config.queue.retry_policy()),
        config.chunking.to_chunking_config(&config.queue),
    ));

    // 启动 Worker 池
    let pool = WorkerPool::new(
        WorkerPoolConfig {
            workers: config.queue.workers,
        },
        queue.clone(),
        chunked_generator,
        quota,
    )
    .arc();
    let worker_handles = pool.spawn();

    if config.queue.auto_start {
        queue.start();
    }

    // 创建 HTTP 服务器
    let state = Arc::new(AppState::new(queue.clone(), event_publisher));
    let server = HttpServer::new(config.server.clone(), state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    // 停止 Worker，进行中的任务记为取消
    pool.shutdown();
    for handle in worker_handles {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Worker exited abnormally");
        }
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}
