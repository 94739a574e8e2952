//! Fake Generator - 用于本地运行和测试的生成器
//!
//! 不调用任何外部服务，按固定规模返回确定性的填充文本

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::application::ports::{GenerateRequest, GenerateResponse, GeneratorError, GeneratorPort};

const FILLER: &[&str] = &[
    "the", "wind", "carried", "ash", "across", "the", "valley", "while", "she", "waited",
    "for", "an", "answer", "that", "never", "came",
];

/// Fake Generator 配置
#[derive(Debug, Clone)]
pub struct FakeGeneratorConfig {
    /// 每次调用返回的词数
    pub words_per_call: usize,
    /// 模拟调用延迟
    pub latency: Duration,
}

impl Default for FakeGeneratorConfig {
    fn default() -> Self {
        Self {
            words_per_call: 1000,
            latency: Duration::from_millis(200),
        }
    }
}

/// Fake Generator
///
/// 分析类提示词返回固定的 JSON 报告，其余返回填充文本
pub struct FakeGenerator {
    config: FakeGeneratorConfig,
    calls: AtomicU64,
}

impl FakeGenerator {
    pub fn new(config: FakeGeneratorConfig) -> Self {
        tracing::info!(
            words_per_call = config.words_per_call,
            latency_ms = config.latency.as_millis() as u64,
            "FakeGenerator initialized"
        );
        Self {
            config,
            calls: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeGeneratorConfig::default())
    }

    /// 已处理的调用次数
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    fn filler(&self, seed: u64) -> String {
        (0..self.config.words_per_call)
            .map(|i| FILLER[(i + seed as usize) % FILLER.len()])
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl GeneratorPort for FakeGenerator {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, GeneratorError> {
        let seed = self.calls.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            prompt_len = request.prompt.len(),
            has_context = request.context.is_some(),
            "FakeGenerator: returning filler text"
        );

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        let text = if request.prompt.contains("JSON object") {
            r#"{"consistency": 7, "completeness": 8, "overall": 7.5, "notes": "fake report"}"#
                .to_string()
        } else {
            self.filler(seed)
        };

        Ok(GenerateResponse { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::SizeUnit;

    fn generator(words: usize) -> FakeGenerator {
        FakeGenerator::new(FakeGeneratorConfig {
            words_per_call: words,
            latency: Duration::ZERO,
        })
    }

    #[tokio::test]
    async fn test_returns_requested_size() {
        let generator = generator(250);
        let response = generator.generate(GenerateRequest::new("write")).await.unwrap();
        assert_eq!(SizeUnit::Words.measure(&response.text), 250);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_analysis_prompt_gets_report() {
        let generator = generator(10);
        let response = generator
            .generate(GenerateRequest::new("Reply with a single JSON object"))
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&response.text).unwrap();
        assert_eq!(json["completeness"], 8);
    }
}
