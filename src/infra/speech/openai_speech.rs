// OpenAI text-to-speech (`POST /v1/audio/speech`).
//
// **Environment Variables:**
// - `OPENAI_TTS_MODEL` - default `tts-1`
// - `OPENAI_TTS_VOICE` - default `alloy`
//
// The endpoint rejects input over 4096 characters, so longer narrations are
// sent in word-boundary chunks and the MP3 responses concatenated.

use super::chunking::split_into_chunks;
use crate::core::speech::{SpeechError, SpeechSynthesizer};
use crate::infra::ai::openai_client::OPENAI_BASE_URL;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

pub const DEFAULT_TTS_MODEL: &str = "tts-1";
pub const DEFAULT_TTS_VOICE: &str = "alloy";
const MAX_INPUT_CHARS: usize = 4096;

pub struct OpenAiSpeech {
    client: Client,
    api_key: String,
    model: String,
    voice: String,
}

impl OpenAiSpeech {
    pub fn new(api_key: String, model: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.into(),
            voice: voice.into(),
        }
    }

    /// The endpoint picks the language from the text itself, so `lang` is
    /// not sent. Slow narration maps to a reduced `speed`.
    fn build_payload(&self, text: &str, slow: bool) -> serde_json::Value {
        let mut payload = json!({
            "model": self.model,
            "voice": self.voice,
            "input": text,
            "response_format": "mp3",
        });
        if slow {
            payload["speed"] = json!(0.75);
        }
        payload
    }

    async fn fetch_chunk(&self, text: &str, slow: bool) -> Result<Vec<u8>, SpeechError> {
        let url = format!("{}/audio/speech", OPENAI_BASE_URL);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.build_payload(text, slow))
            .send()
            .await
            .map_err(|e| SpeechError::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api(format!("{} - {}", status, body)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Api(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(
        &self,
        text: &str,
        _lang: &str,
        slow: bool,
    ) -> Result<Vec<u8>, SpeechError> {
        let chunks = split_into_chunks(text, MAX_INPUT_CHARS);
        if chunks.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        tracing::debug!("Synthesizing {} OpenAI TTS chunk(s)", chunks.len());

        let mut audio = Vec::new();
        for chunk in &chunks {
            audio.extend_from_slice(&self.fetch_chunk(chunk, slow).await?);
        }
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload() {
        let speech = OpenAiSpeech::new("k".to_string(), DEFAULT_TTS_MODEL, "onyx");

        let normal = speech.build_payload("Hello", false);
        assert_eq!(normal["model"], "tts-1");
        assert_eq!(normal["voice"], "onyx");
        assert_eq!(normal["input"], "Hello");
        assert!(normal.get("speed").is_none());

        let slow = speech.build_payload("Hello", true);
        assert_eq!(slow["speed"], 0.75);
    }

    #[test]
    fn test_clamped_narration_fits_the_input_limit() {
        // 5000 characters plus the "..." the narration clamp appends.
        let narration = format!("{}...", &"Bronze spearhead found. ".repeat(209)[..5000]);
        assert_eq!(narration.chars().count(), 5003);

        let chunks = split_into_chunks(&narration, MAX_INPUT_CHARS);

        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_INPUT_CHARS));
    }
}
