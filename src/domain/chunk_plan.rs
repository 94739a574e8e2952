//! 分块计划
//!
//! 把目标规模拆分为有序的生成块，并判断成稿是否需要长度修正

use super::task::SizeUnit;

/// 默认单块规模
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// 默认上下文窗口规模
pub const DEFAULT_CONTEXT_WINDOW: usize = 2000;

/// 默认长度容差 (±10%)
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// 单个生成块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    /// 块索引，从 0 开始
    pub index: usize,
    /// 本块期望生成的规模（最后一块可能小于 chunk_size）
    pub size: usize,
}

impl ChunkSpec {
    pub fn is_first(&self) -> bool {
        self.index == 0
    }
}

/// 分块计划（派生数据，不存储）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    target_size: usize,
    chunk_size: usize,
    num_chunks: usize,
}

impl ChunkPlan {
    /// num_chunks = ceil(target_size / chunk_size)，至少一块
    pub fn new(target_size: usize, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let num_chunks = target_size.div_ceil(chunk_size).max(1);
        Self {
            target_size,
            chunk_size,
            num_chunks,
        }
    }

    pub fn num_chunks(&self) -> usize {
        self.num_chunks
    }

    /// 按顺序列出所有块
    pub fn chunks(&self) -> impl Iterator<Item = ChunkSpec> + '_ {
        (0..self.num_chunks).map(move |index| {
            let consumed = index * self.chunk_size;
            let remaining = self.target_size.saturating_sub(consumed);
            let size = if remaining == 0 {
                self.chunk_size
            } else {
                remaining.min(self.chunk_size)
            };
            ChunkSpec { index, size }
        })
    }

    /// 第 index 块完成后的进度，base_fraction 为分块阶段可用的上限
    pub fn progress_after(&self, index: usize, base_fraction: u8) -> u8 {
        let done = (index + 1).min(self.num_chunks) as f64;
        let value = done / self.num_chunks as f64 * base_fraction as f64;
        value.round() as u8
    }
}

/// 取累积输出末尾的上下文窗口
pub fn context_window<'a>(accumulated: &'a str, window: usize, unit: SizeUnit) -> &'a str {
    unit.tail(accumulated, window)
}

/// 长度修正判断结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthAdjustment {
    /// 在容差范围内，无需修正
    Within,
    /// 需要扩写 delta 个单位
    Expand { current: usize, delta: usize },
    /// 需要删减 delta 个单位
    Contract { current: usize, delta: usize },
}

impl LengthAdjustment {
    /// 判断当前规模是否落在 target ± tolerance*target 之内
    pub fn evaluate(current: usize, target: usize, tolerance: f64) -> Self {
        let band = (target as f64 * tolerance).floor() as usize;
        let lower = target.saturating_sub(band);
        let upper = target + band;
        if current < lower {
            LengthAdjustment::Expand {
                current,
                delta: target - current,
            }
        } else if current > upper {
            LengthAdjustment::Contract {
                current,
                delta: current - target,
            }
        } else {
            LengthAdjustment::Within
        }
    }

    pub fn is_within(&self) -> bool {
        matches!(self, LengthAdjustment::Within)
    }
}
