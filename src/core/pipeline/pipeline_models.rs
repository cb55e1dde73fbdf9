use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// A path to an image on disk plus its lowercase extension.
///
/// Created once and only read afterwards; the pipeline never touches the
/// file behind it except to read its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    path: PathBuf,
    extension: String,
}

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        Self { path, extension }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lowercase extension without the dot (`"jpg"`, `"heic"`, or `""`).
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn is_jpeg(&self) -> bool {
        matches!(self.extension.as_str(), "jpg" | "jpeg")
    }

    /// MIME type used when sending the bytes to a vision model.
    pub fn mime_type(&self) -> &'static str {
        match self.extension.as_str() {
            "png" => "image/png",
            _ => "image/jpeg",
        }
    }

    /// Sibling path with the same stem and a `.jpg` extension.
    pub fn jpeg_sibling(&self) -> PathBuf {
        self.path.with_extension("jpg")
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Free-text description of what the vision model saw in one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding(String);

impl Finding {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One identified object.
///
/// `name` is required when parsing model output. The other fields accept
/// missing values, `null`, numbers and other JSON as text so a sloppy but
/// recognisable record is still kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub time_period: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub country_of_origin: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub additional_info: String,
}

/// `null` becomes empty, scalars their plain text, anything else its JSON.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

/// Everything a pipeline run hands back to the caller.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub narration: String,
    /// Same length and order as the input paths.
    pub normalized_paths: Vec<PathBuf>,
    pub artifacts: Vec<ArtifactRecord>,
    /// How many images produced a finding.
    pub analyzed_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_lowercased() {
        let image = ImageRef::new("/tmp/IMG_0042.HEIC");
        assert_eq!(image.extension(), "heic");
        assert!(!image.is_jpeg());
        assert_eq!(image.jpeg_sibling(), PathBuf::from("/tmp/IMG_0042.jpg"));
    }

    #[test]
    fn test_mime_type_defaults_to_jpeg() {
        assert_eq!(ImageRef::new("a.PNG").mime_type(), "image/png");
        assert_eq!(ImageRef::new("a.jpeg").mime_type(), "image/jpeg");
        assert_eq!(ImageRef::new("a.webp").mime_type(), "image/jpeg");
        assert_eq!(ImageRef::new("no_extension").mime_type(), "image/jpeg");
    }

    #[test]
    fn test_record_requires_name_only() {
        let record: ArtifactRecord = serde_json::from_str(r#"{"name": "Sword"}"#).unwrap();
        assert_eq!(record.name, "Sword");
        assert_eq!(record.time_period, "");

        let missing_name = serde_json::from_str::<ArtifactRecord>(r#"{"time_period": "x"}"#);
        assert!(missing_name.is_err());
    }

    #[test]
    fn test_record_accepts_null_and_numbers_as_text() {
        let record: ArtifactRecord = serde_json::from_str(
            r#"{"name": "Coin", "time_period": 1500, "country_of_origin": null,
                "additional_info": true}"#,
        )
        .unwrap();

        assert_eq!(record.time_period, "1500");
        assert_eq!(record.country_of_origin, "");
        assert_eq!(record.additional_info, "true");

        let null_name = serde_json::from_str::<ArtifactRecord>(r#"{"name": null}"#);
        assert!(null_name.is_err());
    }
}
