//! Task Context - Value Objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::TaskError;

/// 任务唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 任务状态
///
/// `Failed` 专用于配额拒绝（策略阻断），`Error` 表示上游生成失败
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// 等待处理
    Waiting,
    /// 正在生成
    Processing,
    /// 生成完成
    Completed,
    /// 上游生成失败
    Error,
    /// 已取消
    Canceled,
    /// 配额拒绝
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Waiting => "waiting",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Error => "error",
            TaskStatus::Canceled => "canceled",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(TaskStatus::Waiting),
            "processing" => Some(TaskStatus::Processing),
            "completed" => Some(TaskStatus::Completed),
            "error" => Some(TaskStatus::Error),
            "canceled" => Some(TaskStatus::Canceled),
            "failed" => Some(TaskStatus::Failed),
            _ => None,
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Error | TaskStatus::Canceled | TaskStatus::Failed
        )
    }

    /// 是否允许重新提交（回到 Waiting）
    pub fn can_resubmit(&self) -> bool {
        matches!(self, TaskStatus::Error | TaskStatus::Canceled)
    }

    /// 是否允许从队列中移除
    pub fn can_remove(&self) -> bool {
        *self != TaskStatus::Processing
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 任务类型，决定使用哪种 PromptStrategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// 改写已有文本
    Rewrite,
    /// 按大纲创作故事
    Story,
    /// 开篇钩子
    Hook,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Rewrite => "rewrite",
            TaskKind::Story => "story",
            TaskKind::Hook => "hook",
        }
    }
}

impl Default for TaskKind {
    fn default() -> Self {
        TaskKind::Story
    }
}

/// 生成规模的计量单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeUnit {
    /// 按空白分隔的词
    Words,
    /// 按 Unicode 字符（适用于中文等无空格语言）
    Chars,
}

impl Default for SizeUnit {
    fn default() -> Self {
        SizeUnit::Words
    }
}

impl SizeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeUnit::Words => "words",
            SizeUnit::Chars => "chars",
        }
    }

    /// 计算文本规模
    pub fn measure(&self, text: &str) -> usize {
        match self {
            SizeUnit::Words => text.split_whitespace().count(),
            SizeUnit::Chars => text.chars().filter(|c| !c.is_whitespace()).count(),
        }
    }

    /// 取文本末尾最多 `units` 个单位的切片
    pub fn tail<'a>(&self, text: &'a str, units: usize) -> &'a str {
        if units == 0 {
            return "";
        }
        match self {
            SizeUnit::Words => {
                let mut seen = 0;
                let mut in_word = false;
                for (idx, ch) in text.char_indices().rev() {
                    if ch.is_whitespace() {
                        if in_word {
                            seen += 1;
                            in_word = false;
                            if seen == units {
                                return text[idx + ch.len_utf8()..].trim_start();
                            }
                        }
                    } else {
                        in_word = true;
                    }
                }
                text.trim_start()
            }
            SizeUnit::Chars => {
                // 与 measure 一致，只计非空白字符
                let mut seen = 0;
                for (idx, ch) in text.char_indices().rev() {
                    if !ch.is_whitespace() {
                        seen += 1;
                        if seen == units {
                            return &text[idx..];
                        }
                    }
                }
                text.trim_start()
            }
        }
    }
}

/// 生成参数快照
///
/// 入队时捕获，之后不可变，保证同一任务可确定性重放
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// 目标规模
    pub target_size: usize,
    /// 计量单位
    #[serde(default)]
    pub size_unit: SizeUnit,
    /// 风格描述
    #[serde(default)]
    pub style: Option<String>,
    /// 输出语言
    #[serde(default)]
    pub language: Option<String>,
    /// 是否运行质量分析
    #[serde(default)]
    pub analysis: bool,
    /// 任务级覆盖参数
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

impl GenerationSettings {
    pub fn new(target_size: usize) -> Self {
        Self {
            target_size,
            size_unit: SizeUnit::default(),
            style: None,
            language: None,
            analysis: false,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_unit(mut self, unit: SizeUnit) -> Self {
        self.size_unit = unit;
        self
    }

    pub fn with_analysis(mut self, enabled: bool) -> Self {
        self.analysis = enabled;
        self
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// 入队前校验
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.target_size == 0 {
            return Err(TaskError::InvalidSettings(
                "target_size 必须大于 0".to_string(),
            ));
        }
        if self.overrides.keys().any(|k| k.trim().is_empty()) {
            return Err(TaskError::InvalidSettings("覆盖参数名不能为空".to_string()));
        }
        Ok(())
    }
}

/// 质量分析报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// 前后一致性 (0-10)
    pub consistency: f32,
    /// 完整度 (0-10)
    pub completeness: f32,
    /// 综合评分 (0-10)
    pub overall: f32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_names() {
        for status in [
            TaskStatus::Waiting,
            TaskStatus::Processing,
            TaskStatus::Completed,
            TaskStatus::Error,
            TaskStatus::Canceled,
            TaskStatus::Failed,
        ] {
            assert_eq!(TaskStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::from_str("ready"), None);
    }

    #[test]
    fn test_status_rules() {
        assert!(TaskStatus::Error.can_resubmit());
        assert!(TaskStatus::Canceled.can_resubmit());
        assert!(!TaskStatus::Completed.can_resubmit());
        assert!(!TaskStatus::Failed.can_resubmit());
        assert!(!TaskStatus::Processing.can_remove());
        assert!(TaskStatus::Waiting.can_remove());
    }

    #[test]
    fn test_measure_words_and_chars() {
        assert_eq!(SizeUnit::Words.measure("one two  three\nfour"), 4);
        assert_eq!(SizeUnit::Chars.measure("斗之力 三段"), 5);
        assert_eq!(SizeUnit::Words.measure(""), 0);
    }

    #[test]
    fn test_tail_words() {
        let text = "alpha beta gamma delta";
        assert_eq!(SizeUnit::Words.tail(text, 2), "gamma delta");
        assert_eq!(SizeUnit::Words.tail(text, 10), text);
        assert_eq!(SizeUnit::Words.tail(text, 0), "");
    }

    #[test]
    fn test_settings_validation() {
        assert!(GenerationSettings::new(3000).validate().is_ok());
        assert!(GenerationSettings::new(0).validate().is_err());
        assert!(GenerationSettings::new(10)
            .with_override(" ", "x")
            .validate()
            .is_err());
    }

    #[test]
    fn test_tail_chars() {
        assert_eq!(SizeUnit::Chars.tail("陨落的天才", 2), "天才");
        assert_eq!(SizeUnit::Chars.tail("abc", 5), "abc");
        assert_eq!(SizeUnit::Chars.tail("  abc", 5), "abc");
    }

    #[test]
    fn test_tail_chars_skips_whitespace() {
        let text = "a b c d e f g h";
        let tail = SizeUnit::Chars.tail(text, 4);
        assert_eq!(tail, "e f g h");
        assert_eq!(SizeUnit::Chars.measure(tail), 4);
    }

    #[test]
    fn test_settings_deserialize_defaults() {
        let settings: GenerationSettings =
            serde_json::from_str(r#"{"target_size": 3000}"#).unwrap();
        assert_eq!(settings.target_size, 3000);
        assert_eq!(settings.size_unit, SizeUnit::Words);
        assert!(!settings.analysis);
        assert!(settings.overrides.is_empty());
    }
}
