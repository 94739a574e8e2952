//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod queue_commands;
mod task_commands;

pub mod handlers;

pub use queue_commands::*;
pub use task_commands::*;
