// =============================================================================
// GEMINI CLIENT - Google AI Studio API Integration
// =============================================================================
//
// Implementation of `AiProvider` for Google's Gemini API
// (https://ai.google.dev/gemini-api/docs).
//
// **Differences from the OpenAI format:**
// - Authentication: API key is passed as a query parameter (`?key=API_KEY`).
// - Request format: `contents[]` with nested `parts`; the system prompt is a
//   separate top-level `systemInstruction`.
// - Images travel as `inlineData { mimeType, data }` parts instead of data URLs.
// - JSON output is requested with `generationConfig.responseMimeType`.
// - Response text is at `candidates[0].content.parts[*].text`.
//
// **Environment Variables:**
// - `GEMINI_API_KEY` - Your API key from https://aistudio.google.com/apikey

use crate::core::ai::{
    models::{AiConfig, AiMessage, AiProviderResponse, ContentPart, MessageContent, ResponseFormat},
    AiProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;

// =============================================================================
// GEMINI API DATA STRUCTURES
// =============================================================================
//
// See: https://ai.google.dev/api/generate-content

/// A single part of content. Gemini uses a "parts" array for multimodal input.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,

    /// Raw image bytes (base64) with their MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

/// A message in Gemini's format.
#[derive(Debug, Serialize, Deserialize)]
struct Content {
    /// "user" or "model" (Gemini uses "model" instead of "assistant")
    role: String,
    parts: Vec<Part>,
}

/// See: https://ai.google.dev/api/generate-content#generationconfig
#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,

    /// "application/json" asks the model for a JSON document.
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Content,

    /// Why the model stopped generating (e.g., "STOP", "MAX_TOKENS").
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

// =============================================================================
// GEMINI CLIENT IMPLEMENTATION
// =============================================================================

pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    fn text_part(text: String) -> Part {
        Part {
            text: Some(text),
            inline_data: None,
        }
    }

    /// Converts our message content into Gemini parts.
    ///
    /// Data-URL images become `inlineData`; anything that is not a data URL
    /// is dropped because Gemini cannot fetch arbitrary URLs here.
    fn convert_content(content: &MessageContent) -> Vec<Part> {
        match content {
            MessageContent::Text(text) => vec![Self::text_part(text.clone())],
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(Self::text_part(text.clone())),
                    ContentPart::ImageUrl { image_url } => {
                        let Some((mime_type, data)) = image_url.parts() else {
                            tracing::warn!("Gemini request: skipping non-inline image URL");
                            return None;
                        };
                        Some(Part {
                            text: None,
                            inline_data: Some(InlineData {
                                mime_type: mime_type.to_string(),
                                data: data.to_string(),
                            }),
                        })
                    }
                })
                .collect(),
        }
    }

    /// - "assistant" role → "model"
    fn convert_message(msg: &AiMessage) -> Content {
        let role = match msg.role.as_str() {
            "assistant" => "model".to_string(),
            other => other.to_string(),
        };

        Content {
            role,
            parts: Self::convert_content(&msg.content),
        }
    }

    fn build_request(messages: &[AiMessage], config: &AiConfig) -> GenerateContentRequest {
        let system_instruction = messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| Content {
                role: "user".to_string(), // System instruction uses "user" role internally
                parts: Self::convert_content(&m.content),
            });

        let contents = messages
            .iter()
            .filter(|m| m.role != "system")
            .map(Self::convert_message)
            .collect();

        let response_mime_type = match config.response_format {
            ResponseFormat::JsonObject => Some("application/json".to_string()),
            ResponseFormat::Text => None,
        };

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: Some(GenerationConfig {
                max_output_tokens: config.max_tokens,
                response_mime_type,
            }),
        }
    }
}

#[async_trait]
impl AiProvider for GeminiClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        // Format: https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            config.model, self.api_key
        );

        let request = Self::build_request(messages, config);

        // Log request for debugging (be careful not to log the API key!)
        tracing::debug!(
            "Gemini request to model {}: {} messages",
            config.model,
            messages.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(&error_text) {
                return Err(format!(
                    "Gemini API error ({}): {}",
                    status, error_response.error.message
                )
                .into());
            }

            return Err(format!("Gemini API error: {} - {}", status, error_text).into());
        }

        let response_json: GenerateContentResponse = response.json().await?;

        let candidate = response_json
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .ok_or(
                "No content in Gemini response - the model may have been blocked by safety filters",
            )?;

        let content = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        tracing::debug!("Gemini response received: {} chars", content.len());

        Ok(AiProviderResponse {
            content,
            finish_reason: candidate.finish_reason.clone(),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ai::InlineImage;

    #[test]
    fn test_convert_message_assistant_to_model() {
        let msg = AiMessage {
            role: "assistant".to_string(),
            content: MessageContent::Text("Hi there!".to_string()),
        };

        let content = GeminiClient::convert_message(&msg);

        assert_eq!(content.role, "model");
        assert_eq!(content.parts[0].text, Some("Hi there!".to_string()));
    }

    #[test]
    fn test_image_becomes_inline_data() {
        let msg = AiMessage::user(MessageContent::Parts(vec![
            ContentPart::Text {
                text: "Describe".to_string(),
            },
            ContentPart::ImageUrl {
                image_url: InlineImage::from_base64("image/jpeg", "QUJD"),
            },
        ]));

        let content = GeminiClient::convert_message(&msg);

        assert_eq!(content.parts.len(), 2);
        let inline = content.parts[1].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type, "image/jpeg");
        assert_eq!(inline.data, "QUJD");
    }

    #[test]
    fn test_system_prompt_moves_to_system_instruction() {
        let messages = vec![
            AiMessage::system("Be factual."),
            AiMessage::user(MessageContent::Text("What is this?".to_string())),
        ];
        let config = AiConfig::new("gemini-2.5-flash").with_json_response();

        let request = GeminiClient::build_request(&messages, &config);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"].as_array().unwrap().len(), 1);
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be factual.");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(json["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn test_generation_config_serialization() {
        let config = GenerationConfig {
            max_output_tokens: Some(1000),
            response_mime_type: None,
        };

        let json = serde_json::to_string(&config).unwrap();

        assert!(json.contains("\"maxOutputTokens\""));
        assert!(!json.contains("responseMimeType"));
    }
}
