// Google Translate's public text-to-speech endpoint.
//
// No API key is needed, but each request is limited to roughly 100
// characters, so the narration is split on word boundaries and the MP3
// responses are concatenated (MP3 frames play back-to-back).

use super::chunking::split_into_chunks;
use crate::core::speech::{SpeechError, SpeechSynthesizer};
use async_trait::async_trait;
use reqwest::Client;

const TTS_URL: &str = "https://translate.google.com/translate_tts";
const MAX_CHUNK_CHARS: usize = 100;

const NORMAL_SPEED: &str = "1";
const SLOW_SPEED: &str = "0.24";

pub struct GoogleTranslateTts {
    client: Client,
}

impl GoogleTranslateTts {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        index: usize,
        total: usize,
        lang: &str,
        slow: bool,
    ) -> Result<Vec<u8>, SpeechError> {
        let speed = if slow { SLOW_SPEED } else { NORMAL_SPEED };
        let idx = index.to_string();
        let total = total.to_string();
        let len = chunk.chars().count().to_string();

        let response = self
            .client
            .get(TTS_URL)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("q", chunk),
                ("tl", lang),
                ("ttsspeed", speed),
                ("idx", idx.as_str()),
                ("total", total.as_str()),
                ("textlen", len.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SpeechError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SpeechError::Api(format!(
                "TTS chunk {} failed ({})",
                index,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Api(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl Default for GoogleTranslateTts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTranslateTts {
    async fn synthesize(
        &self,
        text: &str,
        lang: &str,
        slow: bool,
    ) -> Result<Vec<u8>, SpeechError> {
        let chunks = split_into_chunks(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        tracing::debug!("Synthesizing {} TTS chunk(s)", chunks.len());

        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let bytes = self
                .fetch_chunk(chunk, index, chunks.len(), lang, slow)
                .await?;
            audio.extend_from_slice(&bytes);
        }
        Ok(audio)
    }
}
