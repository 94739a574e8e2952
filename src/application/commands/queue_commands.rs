//! Queue Commands - 队列级命令

/// 队列控制动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueControl {
    Start,
    Pause,
    Resume,
    /// 取消所有进行中和等待中的任务
    Stop,
}

/// 清空队列命令
#[derive(Debug, Clone, Copy)]
pub struct ClearQueue;
