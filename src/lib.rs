//! Quill - 长文本分块生成队列引擎
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Task Context: 生成任务与状态机
//! - ChunkPlan: 分块计划与长度修正判断
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Generator, QuotaGate, TaskQueue, PromptStrategy）
//! - Pipeline: 分块生成、分类重试
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: TaskQueue 内存实现
//! - Worker: WorkerPool 后台任务处理
//! - Adapters: Generator Client, Quota Gate
//! - Events: 事件发布与统计汇总

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
