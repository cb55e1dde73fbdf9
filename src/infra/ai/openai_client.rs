// Client for OpenAI-compatible chat completion endpoints.
//
// OpenAI itself and OpenRouter speak the same request/response format, so a
// single client covers both; only the base URL and key differ.

use crate::core::ai::{
    models::{AiConfig, AiMessage, AiProviderResponse, ResponseFormat},
    AiProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::error::Error;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, OPENAI_BASE_URL)
    }

    pub fn openrouter(api_key: String) -> Self {
        Self::with_base_url(api_key, OPENROUTER_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_payload(messages: &[AiMessage], config: &AiConfig) -> serde_json::Value {
        let mut payload = json!({
            "model": config.model,
            "messages": messages,
        });

        if let Some(max_tokens) = config.max_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }
        if config.response_format == ResponseFormat::JsonObject {
            payload["response_format"] = json!({ "type": "json_object" });
        }

        payload
    }
}

#[async_trait]
impl AiProvider for OpenAiClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = Self::build_payload(messages, config);

        tracing::debug!(
            "Chat request to model {}: {} messages",
            config.model,
            messages.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(format!("Chat API error: {} - {}", status, text).into());
        }

        let response_json: serde_json::Value = response.json().await?;

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or("Failed to parse response content")?
            .to_string();
        let finish_reason = response_json["choices"][0]["finish_reason"]
            .as_str()
            .map(str::to_string);

        Ok(AiProviderResponse {
            content,
            finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ai::MessageContent;

    #[test]
    fn test_payload_includes_only_configured_options() {
        let messages = vec![AiMessage::user(MessageContent::Text("hi".to_string()))];
        let config = AiConfig::new("gpt-4o").with_max_tokens(500);

        let payload = OpenAiClient::build_payload(&messages, &config);

        assert_eq!(payload["model"], "gpt-4o");
        assert_eq!(payload["max_tokens"], 500);
        assert!(payload.get("response_format").is_none());
        assert_eq!(payload["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_json_response_format() {
        let config = AiConfig::new("gpt-4o").with_json_response();
        let payload = OpenAiClient::build_payload(&[], &config);
        assert_eq!(payload["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = OpenAiClient::with_base_url("k".to_string(), "http://localhost:8080/v1/");
        assert_eq!(client.base_url, "http://localhost:8080/v1");
    }
}
