use super::models::{AiConfig, AiMessage, AiProviderResponse, MessageContent};
use async_trait::async_trait;
use std::error::Error;
use std::sync::Arc;

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request to the AI provider.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>>;
}

// Lets every pipeline stage hold a clone of one shared provider, whether it is
// a concrete client or an `Arc<dyn AiProvider>` picked at runtime.
#[async_trait]
impl<T: AiProvider + ?Sized> AiProvider for Arc<T> {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        (**self).chat_complete(messages, config).await
    }
}

/// A provider bound to one system prompt and one generation config.
///
/// Each pipeline stage (recognition, extraction, narration) owns its own
/// `AiService` so the prompts never leak between stages.
pub struct AiService<P: AiProvider> {
    provider: P,
    system_prompt: String,
    config: AiConfig,
}

impl<P: AiProvider> AiService<P> {
    pub fn new(provider: P, system_prompt: impl Into<String>, config: AiConfig) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            config,
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Sends `system prompt + user content` and returns the trimmed answer.
    /// An empty answer counts as a failure.
    pub async fn complete(
        &self,
        user_content: MessageContent,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let messages = vec![
            AiMessage::system(self.system_prompt.clone()),
            AiMessage::user(user_content),
        ];

        let response = self.provider.chat_complete(&messages, &self.config).await?;

        if let Some(reason) = response.finish_reason.as_deref() {
            tracing::debug!(model = %self.config.model, finish_reason = reason, "Model finished");
        }

        let answer = response.content.trim().to_string();
        if answer.is_empty() {
            return Err("Model returned an empty response".into());
        }

        Ok(answer)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedProvider;
    use super::*;

    #[tokio::test]
    async fn test_complete_sends_system_prompt_first() {
        let provider = ScriptedProvider::new(|_, _| Ok("  answer  ".to_string()));
        let service = AiService::new(
            provider.clone(),
            "You are careful.",
            AiConfig::new("test-model"),
        );

        let answer = service
            .complete(MessageContent::Text("hello".to_string()))
            .await
            .unwrap();

        assert_eq!(answer, "answer");
        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[0][0].role, "system");
        assert_eq!(calls[0][0].content.text(), "You are careful.");
        assert_eq!(calls[0][1].role, "user");
    }

    #[tokio::test]
    async fn test_empty_answer_is_an_error() {
        let provider = ScriptedProvider::new(|_, _| Ok("   ".to_string()));
        let service = AiService::new(provider, "prompt", AiConfig::new("m"));

        let result = service
            .complete(MessageContent::Text("hello".to_string()))
            .await;

        assert!(result.is_err());
    }
}
