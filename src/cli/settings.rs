// Runtime configuration read from the environment (after `.env` is loaded).
//
// Everything goes through a lookup function so tests can feed a map
// instead of touching the process environment.

use crate::core::ai::AiProvider;
use crate::core::speech::SpeechSynthesizer;
use crate::infra::ai::{GeminiClient, OpenAiClient};
use crate::infra::google_drive::CredentialSource;
use crate::infra::speech::openai_speech::{DEFAULT_TTS_MODEL, DEFAULT_TTS_VOICE};
use crate::infra::speech::{GoogleTranslateTts, OpenAiSpeech};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4o";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TOKEN_FILE: &str = "token.json";
const DEFAULT_CONVERSION_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("{var} is not set. {hint}")]
    Missing { var: &'static str, hint: &'static str },
    #[error("{var} has an unsupported value {value:?} (expected {expected})")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiBackend {
    OpenAi,
    OpenRouter,
    Gemini,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AiSettings {
    pub backend: AiBackend,
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
}

impl AiSettings {
    /// `cli_key` is the `--openai-key` flag and wins over `OPENAI_API_KEY`.
    pub fn from_lookup(
        cli_key: Option<String>,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        let backend = match lookup("AI_PROVIDER").as_deref().map(str::trim) {
            None | Some("") | Some("openai") => AiBackend::OpenAi,
            Some("openrouter") => AiBackend::OpenRouter,
            Some("gemini") => AiBackend::Gemini,
            Some(other) => {
                return Err(SettingsError::Invalid {
                    var: "AI_PROVIDER",
                    value: other.to_string(),
                    expected: "openai, openrouter or gemini",
                })
            }
        };

        let settings = match backend {
            AiBackend::OpenAi => Self {
                backend,
                api_key: cli_key.or_else(|| lookup("OPENAI_API_KEY")).ok_or(
                    SettingsError::Missing {
                        var: "OPENAI_API_KEY",
                        hint: "Pass --openai-key or add OPENAI_API_KEY to your .env file.",
                    },
                )?,
                model: lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                base_url: lookup("OPENAI_BASE_URL"),
            },
            AiBackend::OpenRouter => Self {
                backend,
                api_key: lookup("OPENROUTER_API_KEY").ok_or(SettingsError::Missing {
                    var: "OPENROUTER_API_KEY",
                    hint: "Get a key at https://openrouter.ai/keys and add it to your .env file.",
                })?,
                model: lookup("OPENROUTER_MODEL")
                    .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
                base_url: None,
            },
            AiBackend::Gemini => Self {
                backend,
                api_key: lookup("GEMINI_API_KEY").ok_or(SettingsError::Missing {
                    var: "GEMINI_API_KEY",
                    hint: "Get a key at https://aistudio.google.com/apikey and add it to your .env file.",
                })?,
                model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: None,
            },
        };

        Ok(settings)
    }

    pub fn build_provider(&self) -> Arc<dyn AiProvider> {
        let key = self.api_key.clone();
        match (self.backend, &self.base_url) {
            (AiBackend::OpenAi, Some(url)) => Arc::new(OpenAiClient::with_base_url(key, url.as_str())),
            (AiBackend::OpenAi, None) => Arc::new(OpenAiClient::new(key)),
            (AiBackend::OpenRouter, _) => Arc::new(OpenAiClient::openrouter(key)),
            (AiBackend::Gemini, _) => Arc::new(GeminiClient::new(key)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsBackend {
    Google,
    OpenAi,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSettings {
    pub backend: TtsBackend,
    pub lang: String,
    pub slow: bool,
    pub openai_key: Option<String>,
    pub openai_model: String,
    pub openai_voice: String,
}

impl SpeechSettings {
    pub fn from_lookup(
        cli_key: Option<String>,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        let backend = match lookup("TTS_PROVIDER").as_deref().map(str::trim) {
            None | Some("") | Some("google") => TtsBackend::Google,
            Some("openai") => TtsBackend::OpenAi,
            Some(other) => {
                return Err(SettingsError::Invalid {
                    var: "TTS_PROVIDER",
                    value: other.to_string(),
                    expected: "google or openai",
                })
            }
        };

        let openai_key = cli_key.or_else(|| lookup("OPENAI_API_KEY"));
        if backend == TtsBackend::OpenAi && openai_key.is_none() {
            return Err(SettingsError::Missing {
                var: "OPENAI_API_KEY",
                hint: "TTS_PROVIDER=openai needs an OpenAI key; unset it to use Google TTS.",
            });
        }

        Ok(Self {
            backend,
            lang: lookup("TTS_LANG").unwrap_or_else(|| "en".to_string()),
            slow: parse_flag(lookup("TTS_SLOW")),
            openai_key,
            openai_model: lookup("OPENAI_TTS_MODEL").unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
            openai_voice: lookup("OPENAI_TTS_VOICE").unwrap_or_else(|| DEFAULT_TTS_VOICE.to_string()),
        })
    }

    pub fn build_synthesizer(&self) -> Box<dyn SpeechSynthesizer> {
        match (self.backend, &self.openai_key) {
            (TtsBackend::OpenAi, Some(key)) => Box::new(OpenAiSpeech::new(
                key.clone(),
                self.openai_model.clone(),
                self.openai_voice.clone(),
            )),
            _ => Box::new(GoogleTranslateTts::new()),
        }
    }
}

/// Everything `run` needs besides the CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub ai: AiSettings,
    pub speech: SpeechSettings,
    pub drive_credentials: CredentialSource,
    pub conversion_timeout: Duration,
}

impl Settings {
    pub fn from_env(cli_key: Option<String>) -> Result<Self, SettingsError> {
        Self::from_lookup(cli_key, &|name: &str| std::env::var(name).ok())
    }

    /// Blank values count as unset.
    pub fn from_lookup(
        cli_key: Option<String>,
        raw_lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        let lookup = &|name: &str| raw_lookup(name).filter(|v| !v.trim().is_empty());

        let conversion_timeout = match lookup("CONVERSION_TIMEOUT_SECS") {
            None => DEFAULT_CONVERSION_TIMEOUT_SECS,
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| SettingsError::Invalid {
                var: "CONVERSION_TIMEOUT_SECS",
                value: raw,
                expected: "a whole number of seconds",
            })?,
        };

        Ok(Self {
            ai: AiSettings::from_lookup(cli_key.clone(), lookup)?,
            speech: SpeechSettings::from_lookup(cli_key, lookup)?,
            drive_credentials: drive_credentials(lookup),
            conversion_timeout: Duration::from_secs(conversion_timeout),
        })
    }
}

/// Service account variables win over the authorized-user token file.
fn drive_credentials(lookup: &impl Fn(&str) -> Option<String>) -> CredentialSource {
    if let Some(path) = lookup("GOOGLE_SERVICE_ACCOUNT_KEY") {
        return CredentialSource::ServiceAccountFile(PathBuf::from(path.trim()));
    }
    if let Some(json) = lookup("GOOGLE_SERVICE_ACCOUNT_JSON") {
        return CredentialSource::ServiceAccountJson(json);
    }
    CredentialSource::TokenFile(
        lookup("GOOGLE_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE)),
    )
}

fn parse_flag(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}
