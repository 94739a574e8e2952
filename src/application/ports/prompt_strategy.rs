//! Prompt Strategy Port - 按任务类型构建提示词
//!
//! 引擎只负责编排调用顺序，提示词内容由各任务类型的策略提供

use crate::domain::task::GenerationSettings;
use crate::domain::LengthAdjustment;

/// 分块生成的提示词上下文
#[derive(Debug, Clone, Copy)]
pub struct ChunkPromptContext<'a> {
    /// 任务原始输入（大纲、原文等）
    pub input: &'a str,
    pub settings: &'a GenerationSettings,
    pub chunk_index: usize,
    pub num_chunks: usize,
    /// 本块期望规模
    pub chunk_size: usize,
    /// 前文窗口，第 0 块为 None
    pub previous: Option<&'a str>,
}

impl ChunkPromptContext<'_> {
    pub fn is_continuation(&self) -> bool {
        self.previous.is_some()
    }

    pub fn is_last(&self) -> bool {
        self.chunk_index + 1 == self.num_chunks
    }
}

/// 长度修正的提示词上下文
#[derive(Debug, Clone, Copy)]
pub struct NormalizationPromptContext<'a> {
    pub settings: &'a GenerationSettings,
    /// 待修正的全文
    pub text: &'a str,
    pub adjustment: LengthAdjustment,
}

/// Prompt Strategy
///
/// 每种 TaskKind 对应一个实现，由 StrategyRegistry 注入到 ChunkedGenerator
pub trait PromptStrategy: Send + Sync {
    /// 构建第 chunk_index 块的提示词
    fn chunk_prompt(&self, ctx: &ChunkPromptContext<'_>) -> String;

    /// 构建长度修正提示词
    fn normalization_prompt(&self, ctx: &NormalizationPromptContext<'_>) -> String;

    /// 构建质量分析提示词，要求返回 JSON
    fn analysis_prompt(&self, input: &str, text: &str) -> String {
        format!(
            "Evaluate the following text against its brief.\n\
             Reply with a single JSON object and nothing else, shaped as \
             {{\"consistency\": <0-10>, \"completeness\": <0-10>, \"overall\": <0-10>, \"notes\": \"<short remarks>\"}}.\n\n\
             Brief:\n{input}\n\nText:\n{text}"
        )
    }
}
