//! Memory Layer - In-Memory State Management
//!
//! 实现 TaskQueue，管理生成任务和队列状态

mod task_queue;

pub use task_queue::InMemoryTaskQueue;
