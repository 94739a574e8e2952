//! HTTP Generator - 调用外部文本生成 HTTP 服务
//!
//! 实现 GeneratorPort trait，通过 HTTP 调用外部生成服务
//!
//! 外部生成 API:
//! POST http://localhost:8000/api/generate
//! Request: {"prompt": "...", "context": "..."}  (JSON)
//! Response: {"text": "..."}  (JSON)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{GenerateRequest, GenerateResponse, GeneratorError, GeneratorPort};

/// 生成请求体 (JSON)
#[derive(Debug, Serialize)]
struct GenerateHttpRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
}

/// 生成响应体 (JSON)
#[derive(Debug, Deserialize)]
struct GenerateHttpResponse {
    text: String,
}

/// HTTP Generator 配置
#[derive(Debug, Clone)]
pub struct HttpGeneratorConfig {
    /// 生成服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// Bearer Token
    pub api_key: Option<String>,
}

impl Default for HttpGeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
            api_key: None,
        }
    }
}

impl HttpGeneratorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }
}

/// HTTP 文本生成客户端
pub struct HttpGenerator {
    client: Client,
    config: HttpGeneratorConfig,
}

impl HttpGenerator {
    pub fn new(config: HttpGeneratorConfig) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GeneratorError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }
}

/// 把非 2xx 响应归入错误类别
pub fn classify_status(status: StatusCode, body: &str) -> GeneratorError {
    let message = format!("HTTP {}: {}", status.as_u16(), body);
    match status.as_u16() {
        429 | 503 | 529 => GeneratorError::Overloaded(message),
        500..=599 => GeneratorError::ServiceError(message),
        _ => GeneratorError::Rejected(message),
    }
}

fn map_send_error(e: reqwest::Error) -> GeneratorError {
    if e.is_timeout() {
        GeneratorError::Timeout
    } else if e.is_connect() {
        GeneratorError::NetworkError(format!("Cannot connect to generation service: {}", e))
    } else {
        GeneratorError::NetworkError(e.to_string())
    }
}

#[async_trait]
impl GeneratorPort for HttpGenerator {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, GeneratorError> {
        let body = GenerateHttpRequest {
            prompt: &request.prompt,
            context: request.context.as_deref(),
        };

        tracing::debug!(
            url = %self.generate_url(),
            prompt_len = request.prompt.len(),
            context_len = request.context.as_ref().map(|c| c.len()).unwrap_or(0),
            "Sending generate request"
        );

        let mut builder = self.client.post(self.generate_url()).json(&body);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &error_text));
        }

        let parsed: GenerateHttpResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GeneratorError::Timeout
            } else {
                GeneratorError::InvalidResponse(format!("Failed to decode body: {}", e))
            }
        })?;

        tracing::debug!(text_len = parsed.text.len(), "Generate request completed");

        Ok(GenerateResponse { text: parsed.text })
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::ErrorClass;

    #[test]
    fn test_config_default() {
        let config = HttpGeneratorConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 120);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = HttpGeneratorConfig::new("http://example.com:9000/")
            .with_timeout(60)
            .with_api_key(Some(String::new()));
        assert_eq!(config.timeout_secs, 60);
        assert!(config.api_key.is_none());

        let generator = HttpGenerator::new(config).unwrap();
        assert_eq!(generator.generate_url(), "http://example.com:9000/api/generate");
    }

    #[test]
    fn test_status_classification() {
        for code in [429, 503, 529] {
            let err = classify_status(StatusCode::from_u16(code).unwrap(), "busy");
            assert_eq!(ErrorClass::classify(&err), ErrorClass::TransientOverload, "{}", code);
        }
        for code in [500, 502, 504] {
            let err = classify_status(StatusCode::from_u16(code).unwrap(), "oops");
            assert_eq!(ErrorClass::classify(&err), ErrorClass::TransientServer, "{}", code);
        }
        for code in [400, 401, 404, 422] {
            let err = classify_status(StatusCode::from_u16(code).unwrap(), "bad");
            assert_eq!(ErrorClass::classify(&err), ErrorClass::Permanent, "{}", code);
        }
    }

    #[test]
    fn test_status_message_keeps_body() {
        let err = classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(err.to_string(), "Service error: HTTP 500: boom");
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateHttpRequest {
            prompt: "write",
            context: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["prompt"], "write");
        assert!(json.get("context").is_none());
    }
}
