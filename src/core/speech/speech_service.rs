use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Longest text sent to a synthesizer; longer narrations are cut and end in "...".
pub const MAX_SPEECH_CHARS: usize = 5000;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech API error: {0}")]
    Api(String),
    #[error("Nothing to synthesize")]
    EmptyText,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns encoded audio (MP3) for `text`.
    async fn synthesize(&self, text: &str, lang: &str, slow: bool)
        -> Result<Vec<u8>, SpeechError>;
}

#[async_trait]
impl SpeechSynthesizer for Box<dyn SpeechSynthesizer> {
    async fn synthesize(
        &self,
        text: &str,
        lang: &str,
        slow: bool,
    ) -> Result<Vec<u8>, SpeechError> {
        (**self).synthesize(text, lang, slow).await
    }
}

/// Truncates `text` to [`MAX_SPEECH_CHARS`] characters, appending `...` when cut.
pub fn clamp_speech_text(text: &str) -> String {
    if text.chars().count() <= MAX_SPEECH_CHARS {
        return text.to_string();
    }
    let mut clamped: String = text.chars().take(MAX_SPEECH_CHARS).collect();
    clamped.push_str("...");
    clamped
}

pub struct SpeechService<S: SpeechSynthesizer> {
    synthesizer: S,
    lang: String,
    slow: bool,
}

impl<S: SpeechSynthesizer> SpeechService<S> {
    pub fn new(synthesizer: S, lang: impl Into<String>, slow: bool) -> Self {
        Self {
            synthesizer,
            lang: lang.into(),
            slow,
        }
    }

    /// Synthesizes the narration and writes the audio to `output_path`.
    pub async fn narrate_to_file(&self, text: &str, output_path: &Path) -> Result<(), SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let length = text.chars().count();
        if length > MAX_SPEECH_CHARS {
            tracing::warn!("Text is long ({} chars), truncating...", length);
        }
        let text = clamp_speech_text(text);

        let audio = self
            .synthesizer
            .synthesize(&text, &self.lang, self.slow)
            .await?;
        tokio::fs::write(output_path, &audio).await?;

        tracing::info!(
            bytes = audio.len(),
            "Audio saved to: {}",
            output_path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSynthesizer {
        seen: Mutex<Vec<(String, String, bool)>>,
    }

    #[async_trait]
    impl SpeechSynthesizer for RecordingSynthesizer {
        async fn synthesize(
            &self,
            text: &str,
            lang: &str,
            slow: bool,
        ) -> Result<Vec<u8>, SpeechError> {
            self.seen
                .lock()
                .unwrap()
                .push((text.to_string(), lang.to_string(), slow));
            Ok(b"ID3fake".to_vec())
        }
    }

    #[test]
    fn test_short_text_is_not_clamped() {
        assert_eq!(clamp_speech_text("Hello judges"), "Hello judges");
    }

    #[test]
    fn test_long_text_is_clamped_with_ellipsis() {
        let long = "a".repeat(MAX_SPEECH_CHARS + 10);
        let clamped = clamp_speech_text(&long);
        assert_eq!(clamped.chars().count(), MAX_SPEECH_CHARS + 3);
        assert!(clamped.ends_with("..."));
    }

    #[tokio::test]
    async fn test_narration_is_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("narration.mp3");
        let service = SpeechService::new(
            RecordingSynthesizer {
                seen: Mutex::new(Vec::new()),
            },
            "en",
            false,
        );

        service.narrate_to_file("We found a sword.", &out).await.unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"ID3fake");
        let seen = service.synthesizer.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            ("We found a sword.".to_string(), "en".to_string(), false)
        );
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let service = SpeechService::new(
            RecordingSynthesizer {
                seen: Mutex::new(Vec::new()),
            },
            "en",
            false,
        );

        let result = service
            .narrate_to_file("   ", &dir.path().join("x.mp3"))
            .await;

        assert!(matches!(result, Err(SpeechError::EmptyText)));
    }
}
