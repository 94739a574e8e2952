//! 内置 Prompt Strategy
//!
//! - Rewrite: 按风格/语言改写原文
//! - Story: 按大纲写故事
//! - Hook: 开篇钩子

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::ports::{ChunkPromptContext, NormalizationPromptContext, PromptStrategy};
use crate::domain::task::{GenerationSettings, TaskKind};
use crate::domain::LengthAdjustment;

/// 把参数快照渲染为提示词中的约束说明
fn describe_settings(settings: &GenerationSettings) -> String {
    let mut lines = Vec::new();
    if let Some(style) = &settings.style {
        lines.push(format!("- Style: {}", style));
    }
    if let Some(language) = &settings.language {
        lines.push(format!("- Language: {}", language));
    }
    for (key, value) in &settings.overrides {
        lines.push(format!("- {}: {}", key, value));
    }
    if lines.is_empty() {
        String::new()
    } else {
        format!("Requirements:\n{}\n", lines.join("\n"))
    }
}

/// 续写说明，第 0 块之外都要求承接前文而不是重新开始
fn continuation_clause(ctx: &ChunkPromptContext<'_>) -> String {
    if !ctx.is_continuation() {
        return String::new();
    }
    let ending = if ctx.is_last() {
        " This is the final part: bring the piece to a natural close."
    } else {
        ""
    };
    format!(
        "This is part {} of {}. The text so far is given as context. \
         Continue directly from where it stops. Do not restart, summarize or repeat earlier passages.{}\n",
        ctx.chunk_index + 1,
        ctx.num_chunks,
        ending
    )
}

/// 通用的长度修正提示词
fn normalization_instruction(ctx: &NormalizationPromptContext<'_>, subject: &str) -> String {
    let unit = ctx.settings.size_unit.as_str();
    let target = ctx.settings.target_size;
    let instruction = match ctx.adjustment {
        LengthAdjustment::Expand { current, delta } => format!(
            "The {subject} is {current} {unit}, the target is {target} {unit}. \
             Expand it by about {delta} {unit}. Deepen existing scenes with sensory detail, \
             dialogue and characters' inner reactions. Do not add new plot events."
        ),
        LengthAdjustment::Contract { current, delta } => format!(
            "The {subject} is {current} {unit}, the target is {target} {unit}. \
             Shorten it by about {delta} {unit}. Trim peripheral description, merge redundant \
             passages and tighten dialogue. Keep every plot point."
        ),
        LengthAdjustment::Within => format!("Polish the {subject} without changing its length."),
    };
    format!(
        "{instruction}\n{}Return the full revised text only.\n\n{}",
        describe_settings(ctx.settings),
        ctx.text
    )
}

/// 改写策略
#[derive(Debug, Default)]
pub struct RewriteStrategy;

impl PromptStrategy for RewriteStrategy {
    fn chunk_prompt(&self, ctx: &ChunkPromptContext<'_>) -> String {
        format!(
            "Rewrite the source text below into a new version of about {} {} for this part.\n{}{}\nSource:\n{}",
            ctx.chunk_size,
            ctx.settings.size_unit.as_str(),
            describe_settings(ctx.settings),
            continuation_clause(ctx),
            ctx.input
        )
    }

    fn normalization_prompt(&self, ctx: &NormalizationPromptContext<'_>) -> String {
        normalization_instruction(ctx, "rewritten text")
    }
}

/// 故事创作策略
#[derive(Debug, Default)]
pub struct StoryStrategy;

impl PromptStrategy for StoryStrategy {
    fn chunk_prompt(&self, ctx: &ChunkPromptContext<'_>) -> String {
        format!(
            "Write about {} {} of a story following the outline below.\n{}{}\nOutline:\n{}",
            ctx.chunk_size,
            ctx.settings.size_unit.as_str(),
            describe_settings(ctx.settings),
            continuation_clause(ctx),
            ctx.input
        )
    }

    fn normalization_prompt(&self, ctx: &NormalizationPromptContext<'_>) -> String {
        normalization_instruction(ctx, "story")
    }
}

/// 开篇钩子策略
#[derive(Debug, Default)]
pub struct HookStrategy;

impl PromptStrategy for HookStrategy {
    fn chunk_prompt(&self, ctx: &ChunkPromptContext<'_>) -> String {
        format!(
            "Write an opening hook of about {} {} that makes the reader want to keep going. \
             Open on tension or an unanswered question.\n{}{}\nTopic:\n{}",
            ctx.chunk_size,
            ctx.settings.size_unit.as_str(),
            describe_settings(ctx.settings),
            continuation_clause(ctx),
            ctx.input
        )
    }

    fn normalization_prompt(&self, ctx: &NormalizationPromptContext<'_>) -> String {
        normalization_instruction(ctx, "hook")
    }

    fn analysis_prompt(&self, input: &str, text: &str) -> String {
        format!(
            "Rate this opening hook for the topic below.\n\
             Reply with a single JSON object and nothing else, shaped as \
             {{\"consistency\": <0-10>, \"completeness\": <0-10>, \"overall\": <0-10>, \"notes\": \"<short remarks>\"}}.\n\n\
             Topic:\n{input}\n\nHook:\n{text}"
        )
    }
}

/// TaskKind -> PromptStrategy 映射
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: HashMap<TaskKind, Arc<dyn PromptStrategy>>,
}

impl StrategyRegistry {
    /// 空注册表
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// 注册所有内置策略
    pub fn with_defaults() -> Self {
        Self::empty()
            .register(TaskKind::Rewrite, Arc::new(RewriteStrategy))
            .register(TaskKind::Story, Arc::new(StoryStrategy))
            .register(TaskKind::Hook, Arc::new(HookStrategy))
    }

    pub fn register(mut self, kind: TaskKind, strategy: Arc<dyn PromptStrategy>) -> Self {
        self.strategies.insert(kind, strategy);
        self
    }

    pub fn get(&self, kind: TaskKind) -> Option<Arc<dyn PromptStrategy>> {
        self.strategies.get(&kind).cloned()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(
        settings: &'a GenerationSettings,
        chunk_index: usize,
        previous: Option<&'a str>,
    ) -> ChunkPromptContext<'a> {
        ChunkPromptContext {
            input: "A boy fails his strength test",
            settings,
            chunk_index,
            num_chunks: 3,
            chunk_size: 1000,
            previous,
        }
    }

    #[test]
    fn test_first_chunk_has_no_continuation() {
        let settings = GenerationSettings::new(3000).with_style("wuxia");
        let prompt = StoryStrategy.chunk_prompt(&ctx(&settings, 0, None));
        assert!(prompt.contains("A boy fails his strength test"));
        assert!(prompt.contains("Style: wuxia"));
        assert!(!prompt.contains("Do not restart"));
    }

    #[test]
    fn test_later_chunk_asks_to_continue() {
        let settings = GenerationSettings::new(3000);
        let prompt = StoryStrategy.chunk_prompt(&ctx(&settings, 2, Some("previous text")));
        assert!(prompt.contains("part 3 of 3"));
        assert!(prompt.contains("Do not restart"));
        assert!(prompt.contains("final part"));
    }

    #[test]
    fn test_normalization_prompt_is_actionable() {
        let settings = GenerationSettings::new(3000);
        let expand = RewriteStrategy.normalization_prompt(&NormalizationPromptContext {
            settings: &settings,
            text: "short",
            adjustment: LengthAdjustment::Expand {
                current: 2000,
                delta: 1000,
            },
        });
        assert!(expand.contains("Expand it by about 1000 words"));
        assert!(expand.contains("sensory detail"));

        let contract = RewriteStrategy.normalization_prompt(&NormalizationPromptContext {
            settings: &settings,
            text: "long",
            adjustment: LengthAdjustment::Contract {
                current: 4000,
                delta: 1000,
            },
        });
        assert!(contract.contains("Shorten it by about 1000 words"));
        assert!(contract.contains("Trim peripheral description"));
    }

    #[test]
    fn test_registry_defaults_cover_all_kinds() {
        let registry = StrategyRegistry::with_defaults();
        for kind in [TaskKind::Rewrite, TaskKind::Story, TaskKind::Hook] {
            assert!(registry.get(kind).is_some());
        }
        assert!(StrategyRegistry::empty().get(TaskKind::Story).is_none());
    }
}
