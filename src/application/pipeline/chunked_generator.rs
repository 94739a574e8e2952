//! Chunked Generator - 分块长文生成
//!
//! 流程:
//! 1. 按目标规模计算分块计划
//! 2. 逐块生成，第 i>0 块携带前文窗口作为上下文
//! 3. 长度修正（单次，尽力而为）
//! 4. 可选的质量分析（失败不影响任务完成）

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::retry::cancellable_sleep;
use super::{PipelineError, RetryExecutor, StrategyRegistry};
use crate::application::ports::{
    ChunkPromptContext, GenerateRequest, GeneratorPort, NormalizationPromptContext,
    PromptStrategy,
};
use crate::domain::task::{QualityReport, Task};
use crate::domain::{
    context_window, ChunkPlan, LengthAdjustment, DEFAULT_CHUNK_SIZE, DEFAULT_CONTEXT_WINDOW,
    DEFAULT_TOLERANCE,
};

/// 分块生成配置
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// 单块规模
    pub chunk_size: usize,
    /// 前文窗口规模
    pub context_window: usize,
    /// 长度容差
    pub tolerance: f64,
    /// 分块阶段占用的进度上限，剩余部分留给修正和分析
    pub base_fraction: u8,
    /// 块间节流延迟
    pub inter_chunk_delay: Duration,
    /// 是否执行长度修正
    pub normalize: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            context_window: DEFAULT_CONTEXT_WINDOW,
            tolerance: DEFAULT_TOLERANCE,
            base_fraction: 90,
            inter_chunk_delay: Duration::from_millis(1500),
            normalize: true,
        }
    }
}

/// 生成结果
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub text: String,
    pub analysis: Option<QualityReport>,
    /// 实际生成的块数
    pub chunks: usize,
    /// 是否发起过长度修正调用
    pub normalized: bool,
}

/// 分块生成器
///
/// 同一任务内的块严格串行，第 i+1 块必须看到第 i 块的输出
pub struct ChunkedGenerator {
    generator: Arc<dyn GeneratorPort>,
    strategies: StrategyRegistry,
    retry: RetryExecutor,
    config: ChunkingConfig,
}

impl ChunkedGenerator {
    pub fn new(
        generator: Arc<dyn GeneratorPort>,
        strategies: StrategyRegistry,
        retry: RetryExecutor,
        config: ChunkingConfig,
    ) -> Self {
        Self {
            generator,
            strategies,
            retry,
            config,
        }
    }

    /// 执行一个任务的完整生成流程
    ///
    /// `on_progress` 在每个阶段结束后收到 0-100 的进度值
    pub async fn run<P>(
        &self,
        task: &Task,
        cancel: &CancellationToken,
        on_progress: P,
    ) -> Result<GenerationOutcome, PipelineError>
    where
        P: Fn(u8) + Send + Sync,
    {
        let strategy = self.strategies.get(task.kind()).ok_or_else(|| {
            PipelineError::Permanent(format!(
                "No prompt strategy registered for kind: {}",
                task.kind().as_str()
            ))
        })?;

        let settings = task.settings();
        let plan = ChunkPlan::new(settings.target_size, self.config.chunk_size);

        tracing::debug!(
            task_id = %task.id(),
            target_size = settings.target_size,
            num_chunks = plan.num_chunks(),
            "Chunk plan computed"
        );

        let mut accumulated = String::new();

        for chunk in plan.chunks() {
            if !chunk.is_first() {
                cancellable_sleep(self.config.inter_chunk_delay, cancel).await?;
            }

            let request = {
                let previous = if chunk.is_first() {
                    None
                } else {
                    Some(context_window(
                        &accumulated,
                        self.config.context_window,
                        settings.size_unit,
                    ))
                };
                let ctx = ChunkPromptContext {
                    input: task.input(),
                    settings,
                    chunk_index: chunk.index,
                    num_chunks: plan.num_chunks(),
                    chunk_size: chunk.size,
                    previous,
                };
                let request = GenerateRequest::new(strategy.chunk_prompt(&ctx));
                match previous {
                    Some(previous) => request.with_context(previous),
                    None => request,
                }
            };

            let text = self.call("chunk", &request, cancel).await?;
            append_chunk(&mut accumulated, &text);

            tracing::debug!(
                task_id = %task.id(),
                chunk_index = chunk.index,
                chunk_units = settings.size_unit.measure(&text),
                "Chunk generated"
            );
            on_progress(plan.progress_after(chunk.index, self.config.base_fraction));
        }

        let mut normalized = false;
        if self.config.normalize {
            let current = settings.size_unit.measure(&accumulated);
            let adjustment =
                LengthAdjustment::evaluate(current, settings.target_size, self.config.tolerance);

            if !adjustment.is_within() {
                cancellable_sleep(self.config.inter_chunk_delay, cancel).await?;
                let revised = self
                    .normalize(strategy.as_ref(), task, &accumulated, adjustment, cancel)
                    .await?;
                normalized = true;

                if revised.trim().is_empty() {
                    tracing::warn!(
                        task_id = %task.id(),
                        "Normalization returned empty text, keeping original"
                    );
                } else {
                    tracing::info!(
                        task_id = %task.id(),
                        before = current,
                        after = settings.size_unit.measure(&revised),
                        target = settings.target_size,
                        "Length normalized"
                    );
                    accumulated = revised.trim().to_string();
                }
            }
        }

        let analysis = if settings.analysis {
            match self
                .analyze(strategy.as_ref(), task, &accumulated, cancel)
                .await
            {
                Ok(report) => report,
                Err(PipelineError::Canceled) => return Err(PipelineError::Canceled),
                Err(e) => {
                    tracing::warn!(
                        task_id = %task.id(),
                        error = %e,
                        "Quality analysis failed, continuing without report"
                    );
                    None
                }
            }
        } else {
            None
        };

        if cancel.is_cancelled() {
            return Err(PipelineError::Canceled);
        }

        on_progress(post_pass_progress(self.config.base_fraction));

        Ok(GenerationOutcome {
            text: accumulated,
            analysis,
            chunks: plan.num_chunks(),
            normalized,
        })
    }

    async fn normalize(
        &self,
        strategy: &dyn PromptStrategy,
        task: &Task,
        text: &str,
        adjustment: LengthAdjustment,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let prompt = strategy.normalization_prompt(&NormalizationPromptContext {
            settings: task.settings(),
            text,
            adjustment,
        });
        self.call("normalize", &GenerateRequest::new(prompt), cancel)
            .await
    }

    async fn analyze(
        &self,
        strategy: &dyn PromptStrategy,
        task: &Task,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<QualityReport>, PipelineError> {
        let prompt = strategy.analysis_prompt(task.input(), text);
        let raw = self
            .call("analyze", &GenerateRequest::new(prompt), cancel)
            .await?;
        let report = parse_report(&raw);
        if report.is_none() {
            tracing::warn!(task_id = %task.id(), "Quality report could not be parsed");
        }
        Ok(report)
    }

    async fn call(
        &self,
        operation: &str,
        request: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let response = self
            .retry
            .execute(operation, cancel, || self.generator.generate(request.clone()))
            .await?;
        Ok(response.text)
    }
}

/// 分块阶段之后的进度：剩余区间的一半
fn post_pass_progress(base_fraction: u8) -> u8 {
    let base = base_fraction.min(100);
    base + (100 - base) / 2
}

fn append_chunk(accumulated: &mut String, chunk: &str) {
    let chunk = chunk.trim();
    if chunk.is_empty() {
        return;
    }
    if !accumulated.is_empty() {
        accumulated.push_str("\n\n");
    }
    accumulated.push_str(chunk);
}

/// 从模型回复中提取 JSON 报告，容忍前后多余文字
fn parse_report(raw: &str) -> Option<QualityReport> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    let mut report: QualityReport = serde_json::from_str(&raw[start..=end]).ok()?;
    report.consistency = report.consistency.clamp(0.0, 10.0);
    report.completeness = report.completeness.clamp(0.0, 10.0);
    report.overall = report.overall.clamp(0.0, 10.0);
    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::RetryPolicy;
    use crate::application::ports::{GenerateResponse, GeneratorError};
    use crate::domain::task::{GenerationSettings, TaskKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    type Responder = Box<dyn Fn(usize) -> Result<String, GeneratorError> + Send + Sync>;

    /// 按调用序号返回预设结果，并记录所有请求
    struct ScriptedGenerator {
        requests: Mutex<Vec<GenerateRequest>>,
        respond: Responder,
    }

    impl ScriptedGenerator {
        fn new(
            respond: impl Fn(usize) -> Result<String, GeneratorError> + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                respond: Box::new(respond),
            })
        }

        fn requests(&self) -> Vec<GenerateRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GeneratorPort for ScriptedGenerator {
        async fn generate(
            &self,
            request: GenerateRequest,
        ) -> Result<GenerateResponse, GeneratorError> {
            let index = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(request);
                requests.len() - 1
            };
            (self.respond)(index).map(|text| GenerateResponse { text })
        }
    }

    fn words(tag: &str, n: usize) -> String {
        vec![tag; n].join(" ")
    }

    fn generator_for(scripted: Arc<ScriptedGenerator>) -> ChunkedGenerator {
        ChunkedGenerator::new(
            scripted,
            StrategyRegistry::with_defaults(),
            RetryExecutor::new(RetryPolicy {
                max_retries: 3,
                server_base_delay: Duration::from_millis(10),
                overload_base_delay: Duration::from_millis(20),
            }),
            ChunkingConfig {
                inter_chunk_delay: Duration::ZERO,
                ..ChunkingConfig::default()
            },
        )
    }

    fn story(target: usize) -> Task {
        Task::new("t", TaskKind::Story, "outline", GenerationSettings::new(target))
    }

    #[tokio::test]
    async fn test_chunks_are_sequential_and_carry_context() {
        let scripted = ScriptedGenerator::new(|i| Ok(words(&format!("c{}", i), 1000)));
        let generator = generator_for(scripted.clone());

        let outcome = generator
            .run(&story(3000), &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        let requests = scripted.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].context.is_none());
        // 第 i 块的上下文以第 i-1 块的输出结尾
        assert!(requests[1].context.as_deref().unwrap().ends_with("c0"));
        assert!(requests[2].context.as_deref().unwrap().ends_with("c1"));
        assert!(requests[2].context.as_deref().unwrap().contains("c0"));
        assert_eq!(outcome.chunks, 3);
        assert!(!outcome.normalized);
    }

    #[tokio::test]
    async fn test_context_window_is_bounded() {
        let scripted = ScriptedGenerator::new(|i| Ok(words(&format!("c{}", i), 1500)));
        let generator = generator_for(scripted.clone());

        generator
            .run(&story(3000), &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        let requests = scripted.requests();
        let context = requests[2].context.as_deref().unwrap();
        assert_eq!(context.split_whitespace().count(), 2000);
    }

    #[tokio::test]
    async fn test_normalization_fires_once_when_out_of_band() {
        let scripted = ScriptedGenerator::new(|i| {
            if i < 3 {
                Ok(words("short", 500))
            } else {
                Ok(words("expanded", 2950))
            }
        });
        let generator = generator_for(scripted.clone());

        let outcome = generator
            .run(&story(3000), &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        let requests = scripted.requests();
        assert_eq!(requests.len(), 4);
        assert!(requests[3].prompt.contains("Expand it by about 1500 words"));
        assert!(outcome.normalized);
        assert_eq!(outcome.text.split_whitespace().count(), 2950);
    }

    #[tokio::test]
    async fn test_normalization_result_accepted_even_if_still_off() {
        let scripted = ScriptedGenerator::new(|i| {
            if i < 3 {
                Ok(words("long", 1500))
            } else {
                Ok(words("trimmed", 4000))
            }
        });
        let generator = generator_for(scripted.clone());

        let outcome = generator
            .run(&story(3000), &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(scripted.requests().len(), 4);
        assert!(scripted.requests()[3].prompt.contains("Shorten it"));
        assert_eq!(outcome.text.split_whitespace().count(), 4000);
    }

    #[tokio::test]
    async fn test_progress_sequence() {
        let scripted = ScriptedGenerator::new(|_| Ok(words("w", 1000)));
        let generator = generator_for(scripted);
        let seen = Mutex::new(Vec::new());

        generator
            .run(&story(3000), &CancellationToken::new(), |p| {
                seen.lock().unwrap().push(p)
            })
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![30, 60, 90, 95]);
    }

    #[tokio::test]
    async fn test_analysis_report_parsed() {
        let scripted = ScriptedGenerator::new(|i| {
            if i == 0 {
                Ok(words("w", 1000))
            } else {
                Ok(concat!(
                    "Sure! {\"consistency\": 8, \"completeness\": 7.5, ",
                    "\"overall\": 12, \"notes\": \"tight\"}"
                )
                .to_string())
            }
        });
        let generator = generator_for(scripted.clone());
        let task = Task::new(
            "t",
            TaskKind::Hook,
            "topic",
            GenerationSettings::new(1000).with_analysis(true),
        );

        let outcome = generator
            .run(&task, &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        let report = outcome.analysis.unwrap();
        assert_eq!(report.consistency, 8.0);
        assert_eq!(report.overall, 10.0);
        assert_eq!(report.notes.as_deref(), Some("tight"));
    }

    #[tokio::test]
    async fn test_analysis_failure_is_not_fatal() {
        let scripted = ScriptedGenerator::new(|i| {
            if i == 0 {
                Ok(words("w", 1000))
            } else {
                Err(GeneratorError::Rejected("analysis not allowed".into()))
            }
        });
        let generator = generator_for(scripted.clone());
        let task = Task::new(
            "t",
            TaskKind::Story,
            "outline",
            GenerationSettings::new(1000).with_analysis(true),
        );

        let outcome = generator
            .run(&task, &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert!(outcome.analysis.is_none());
        assert_eq!(outcome.text.split_whitespace().count(), 1000);
    }

    #[tokio::test]
    async fn test_permanent_chunk_error_aborts() {
        let scripted = ScriptedGenerator::new(|i| {
            if i == 1 {
                Err(GeneratorError::Rejected("HTTP 400".into()))
            } else {
                Ok(words("w", 1000))
            }
        });
        let generator = generator_for(scripted.clone());

        let result = generator
            .run(&story(3000), &CancellationToken::new(), |_| {})
            .await;

        assert!(matches!(result, Err(PipelineError::Permanent(_))));
        assert_eq!(scripted.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_between_chunks() {
        let scripted = ScriptedGenerator::new(|_| Ok(words("w", 1000)));
        let generator = ChunkedGenerator::new(
            scripted.clone(),
            StrategyRegistry::with_defaults(),
            RetryExecutor::default(),
            ChunkingConfig::default(),
        );
        let cancel = CancellationToken::new();

        let result = generator
            .run(&story(3000), &cancel, |_| cancel.cancel())
            .await;

        assert_eq!(result.unwrap_err(), PipelineError::Canceled);
        assert_eq!(scripted.requests().len(), 1);
    }

    #[test]
    fn test_parse_report_rejects_garbage() {
        assert!(parse_report("no json here").is_none());
        assert!(parse_report("} {").is_none());
    }
}
