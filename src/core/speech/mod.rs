pub mod speech_service;

pub use speech_service::{SpeechError, SpeechService, SpeechSynthesizer};
