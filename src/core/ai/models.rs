use serde::{Deserialize, Serialize};

/// One message in a chat completion request.
///
/// `content` is either plain text or a list of multimodal parts, which is
/// exactly how the OpenAI-style chat API accepts it on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiMessage {
    pub role: String,
    pub content: MessageContent,
}

impl AiMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(content: MessageContent) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[cfg(test)]
impl MessageContent {
    /// Concatenated text of the message, ignoring any image parts.
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn images(&self) -> Vec<&InlineImage> {
        match self {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::ImageUrl { image_url } => Some(image_url),
                    ContentPart::Text { .. } => None,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: InlineImage },
}

/// An image carried inline as a `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InlineImage {
    pub url: String,
}

impl InlineImage {
    pub fn from_base64(mime_type: &str, base64_data: &str) -> Self {
        Self {
            url: format!("data:{};base64,{}", mime_type, base64_data),
        }
    }

    /// Splits the data URL back into `(mime_type, base64_payload)`.
    /// Providers that take raw inline data (Gemini) need the pieces.
    pub fn parts(&self) -> Option<(&str, &str)> {
        let rest = self.url.strip_prefix("data:")?;
        let (mime, data) = rest.split_once(";base64,")?;
        Some((mime, data))
    }
}

/// Requested shape of the model's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    JsonObject,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub model: String,
    pub max_tokens: Option<u32>,
    pub response_format: ResponseFormat,
}

impl AiConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: None,
            response_format: ResponseFormat::Text,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_json_response(mut self) -> Self {
        self.response_format = ResponseFormat::JsonObject;
        self
    }
}

/// Raw response from an AI provider.
#[derive(Debug, Clone, Default)]
pub struct AiProviderResponse {
    /// The main response content from the model.
    pub content: String,

    /// Why generation stopped, if the provider reports it.
    pub finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multimodal_message_serialization() {
        let msg = AiMessage::user(MessageContent::Parts(vec![
            ContentPart::Text {
                text: "What is this?".to_string(),
            },
            ContentPart::ImageUrl {
                image_url: InlineImage::from_base64("image/jpeg", "QUJD"),
            },
        ]));

        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["role"], "user");
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "image_url");
        assert_eq!(
            json["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,QUJD"
        );
    }

    #[test]
    fn test_plain_text_message_serializes_as_string() {
        let msg = AiMessage::system("Be factual.");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"], "Be factual.");
    }

    #[test]
    fn test_inline_image_parts() {
        let image = InlineImage::from_base64("image/png", "AAAA");
        assert_eq!(image.parts(), Some(("image/png", "AAAA")));

        let bogus = InlineImage {
            url: "https://example.com/a.png".to_string(),
        };
        assert_eq!(bogus.parts(), None);
    }
}
