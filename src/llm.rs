use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmSettings;

/// Text generation capability the assistant depends on.
#[async_trait]
pub trait Generate: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Client for any OpenAI-compatible chat completions endpoint.
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") || base.ends_with("/openai") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    /// Non-streaming chat completion.
    pub async fn chat(&self, messages: &[Message]) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let resp = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("LLM request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read LLM response")?;
        if !status.is_success() {
            return Err(anyhow!("LLM provider returned {}: {}", status, snippet(&text)));
        }

        let json: serde_json::Value =
            serde_json::from_str(&text).context("Failed to parse LLM JSON")?;

        // choices[0].message.content; anything else is a malformed reply
        json["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Unexpected response format from LLM provider"))
    }
}

#[async_trait]
impl Generate for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let messages = vec![Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        }];
        self.chat(&messages).await
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: String) -> LlmSettings {
        LlmSettings {
            base_url,
            model: "test-model".to_string(),
            api_key: "secret".to_string(),
            temperature: 0.7,
            max_tokens: 256,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_endpoint_resolution() {
        let mk = |base: &str| LlmClient::new(&settings(base.to_string())).unwrap().endpoint();
        assert_eq!(mk("http://x/v1"), "http://x/v1/chat/completions");
        assert_eq!(mk("http://x/v1/"), "http://x/v1/chat/completions");
        assert_eq!(mk("http://x"), "http://x/v1/chat/completions");
        assert_eq!(
            mk("https://g/v1beta/openai"),
            "https://g/v1beta/openai/chat/completions"
        );
        assert_eq!(mk("http://x/chat/completions"), "http://x/chat/completions");
    }

    #[tokio::test]
    async fn test_generate_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Use the Cancel API."}}]
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new(&settings(server.uri())).unwrap();
        let answer = client.generate("how to cancel").await.unwrap();
        assert_eq!(answer, "Use the Cancel API.");
    }

    #[tokio::test]
    async fn test_malformed_response_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new(&settings(server.uri())).unwrap();
        assert!(client.generate("hi").await.is_err());
    }

    #[tokio::test]
    async fn test_provider_error_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = LlmClient::new(&settings(server.uri())).unwrap();
        let err = client.generate("hi").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
