pub mod chunking;
pub mod google_translate_tts;
pub mod openai_speech;

pub use google_translate_tts::GoogleTranslateTts;
pub use openai_speech::OpenAiSpeech;
