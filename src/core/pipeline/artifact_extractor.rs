use super::pipeline_models::{ArtifactRecord, Finding};
use super::prompts::{extraction_user_prompt, EXTRACTION_MAX_TOKENS, EXTRACTION_SYSTEM_PROMPT};
use crate::core::ai::{AiConfig, AiProvider, AiService, MessageContent};
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

/// Characters of the source finding kept in a fallback record.
const EXCERPT_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Extraction request failed: {0}")]
    Model(String),
    #[error("Extraction response was not a recognised artifact list: {0}")]
    Parse(#[from] serde_json::Error),
}

// =============================================================================
// RESPONSE SHAPES
// =============================================================================
//
// Models do not reliably honour the requested wrapper. Every shape we accept
// is one variant here and gets flattened into `Vec<ArtifactRecord>` right at
// the boundary. Variant order matters: serde tries them top to bottom.

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtractionPayload {
    /// `[{...}, {...}]`
    List(Vec<ArtifactRecord>),
    /// `{"artifacts": [{...}]}`
    Wrapped { artifacts: Vec<ArtifactRecord> },
    /// `{"sword": {...}, "coins": [{...}, {...}]}`
    Keyed(IndexMap<String, RecordGroup>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordGroup {
    One(ArtifactRecord),
    Many(Vec<ArtifactRecord>),
}

impl ExtractionPayload {
    fn into_records(self) -> Vec<ArtifactRecord> {
        match self {
            ExtractionPayload::List(records) => records,
            ExtractionPayload::Wrapped { artifacts } => artifacts,
            ExtractionPayload::Keyed(groups) => groups
                .into_values()
                .flat_map(|group| match group {
                    RecordGroup::One(record) => vec![record],
                    RecordGroup::Many(records) => records,
                })
                .collect(),
        }
    }
}

/// Parses a model answer into artifact records, accepting any known shape.
pub fn parse_artifacts(raw: &str) -> Result<Vec<ArtifactRecord>, ExtractionError> {
    let payload: ExtractionPayload = serde_json::from_str(strip_code_fence(raw))?;
    Ok(payload.into_records())
}

/// Removes a surrounding Markdown code fence (```json ... ```), if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

// =============================================================================
// KEYWORD FALLBACK
// =============================================================================

struct KeywordRule {
    keywords: &'static [&'static str],
    name: &'static str,
    time_period: &'static str,
    country_of_origin: &'static str,
}

const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["coin"],
        name: "Coin",
        time_period: "Modern (Penny, Dime) and ancient coin drawings",
        country_of_origin: "United States (modern coins), unknown for drawings",
    },
    KeywordRule {
        keywords: &["pot", "vessel"],
        name: "Brass Pot",
        time_period: "Bronze Age to medieval (estimated)",
        country_of_origin: "Unknown",
    },
    KeywordRule {
        keywords: &["sword"],
        name: "Sword",
        time_period: "Medieval period (estimated)",
        country_of_origin: "Unknown",
    },
    KeywordRule {
        keywords: &["bone"],
        name: "Bone",
        time_period: "Unknown",
        country_of_origin: "Unknown",
    },
    KeywordRule {
        keywords: &["drawing", "carving"],
        name: "Stone Carving",
        time_period: "Ancient (estimated)",
        country_of_origin: "Unknown",
    },
];

/// Builds records by plain substring matching over each finding.
///
/// One record per matched rule per finding. The same artifact seen in two
/// photos is listed twice, and a finding with no keywords adds nothing.
pub fn keyword_fallback(findings: &[Finding]) -> Vec<ArtifactRecord> {
    let mut records = Vec::new();

    for finding in findings {
        let lower = finding.as_str().to_lowercase();
        for rule in KEYWORD_RULES {
            if rule.keywords.iter().any(|k| lower.contains(k)) {
                records.push(ArtifactRecord {
                    name: rule.name.to_string(),
                    time_period: rule.time_period.to_string(),
                    country_of_origin: rule.country_of_origin.to_string(),
                    additional_info: excerpt(finding.as_str()),
                });
            }
        }
    }

    records
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(EXCERPT_CHARS).collect();
    short.push_str("...");
    short
}

// =============================================================================
// EXTRACTOR
// =============================================================================

/// Turns free-text findings into structured artifact records.
pub struct ArtifactExtractor<P: AiProvider> {
    ai: AiService<P>,
}

impl<P: AiProvider> ArtifactExtractor<P> {
    pub fn new(provider: P, model: impl Into<String>) -> Self {
        let config = AiConfig::new(model)
            .with_max_tokens(EXTRACTION_MAX_TOKENS)
            .with_json_response();
        Self {
            ai: AiService::new(provider, EXTRACTION_SYSTEM_PROMPT, config),
        }
    }

    /// Never fails: a failed request or unparseable answer switches to
    /// [`keyword_fallback`].
    pub async fn extract(&self, findings: &[Finding]) -> Vec<ArtifactRecord> {
        match self.extract_structured(findings).await {
            Ok(records) => {
                tracing::info!("Extracted {} artifact record(s)", records.len());
                records
            }
            Err(e) => {
                tracing::warn!("Structured extraction failed, using keyword scan: {}", e);
                keyword_fallback(findings)
            }
        }
    }

    async fn extract_structured(
        &self,
        findings: &[Finding],
    ) -> Result<Vec<ArtifactRecord>, ExtractionError> {
        let prompt = extraction_user_prompt(findings);
        let raw = self
            .ai
            .complete(MessageContent::Text(prompt))
            .await
            .map_err(|e| ExtractionError::Model(e.to_string()))?;
        parse_artifacts(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ai::ai_service::testing::ScriptedProvider;
    use crate::core::ai::models::ResponseFormat;

    fn record(name: &str) -> ArtifactRecord {
        ArtifactRecord {
            name: name.to_string(),
            time_period: "Medieval".to_string(),
            country_of_origin: "Unknown".to_string(),
            additional_info: String::new(),
        }
    }

    const SWORD: &str = r#"{"name": "Sword", "time_period": "Medieval", "country_of_origin": "Unknown", "additional_info": ""}"#;
    const COIN: &str = r#"{"name": "Coin", "time_period": "Medieval", "country_of_origin": "Unknown", "additional_info": ""}"#;

    #[test]
    fn test_all_shapes_flatten_to_the_same_records() {
        let expected = vec![record("Sword"), record("Coin")];

        let bare = format!("[{}, {}]", SWORD, COIN);
        let wrapped = format!(r#"{{"artifacts": [{}, {}]}}"#, SWORD, COIN);
        let keyed = format!(r#"{{"weapon": {}, "money": [{}]}}"#, SWORD, COIN);

        assert_eq!(parse_artifacts(&bare).unwrap(), expected);
        assert_eq!(parse_artifacts(&wrapped).unwrap(), expected);
        assert_eq!(parse_artifacts(&keyed).unwrap(), expected);
    }

    #[test]
    fn test_null_and_numeric_fields_keep_the_structured_answer() {
        let raw = r#"{"artifacts": [
            {"name": "Sword", "time_period": "Medieval", "country_of_origin": null, "additional_info": ""},
            {"name": "Coin", "time_period": 1500, "country_of_origin": "Unknown", "additional_info": null}
        ]}"#;

        let records = parse_artifacts(raw).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Sword");
        assert_eq!(records[0].country_of_origin, "");
        assert_eq!(records[1].time_period, "1500");
        assert_eq!(records[1].additional_info, "");
    }

    #[test]
    fn test_keyed_shape_keeps_key_order() {
        let keyed = format!(r#"{{"z": [{}], "a": {}}}"#, COIN, SWORD);
        let names: Vec<_> = parse_artifacts(&keyed)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Coin", "Sword"]);
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let fenced = format!("```json\n{{\"artifacts\": [{}]}}\n```", SWORD);
        assert_eq!(parse_artifacts(&fenced).unwrap(), vec![record("Sword")]);
    }

    #[test]
    fn test_unrecognised_shapes_are_errors() {
        assert!(parse_artifacts("The drone saw a sword.").is_err());
        assert!(parse_artifacts(r#"{"artifacts": "none"}"#).is_err());
        assert!(parse_artifacts(r#"{"summary": "a sword"}"#).is_err());
    }

    #[test]
    fn test_fallback_sword_yields_one_sword_record() {
        let findings = vec![Finding::new("A rusted sword lies in the sand.")];
        let records = keyword_fallback(&findings);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Sword");
        assert_eq!(records[0].additional_info, "A rusted sword lies in the sand.");
    }

    #[test]
    fn test_fallback_keeps_duplicates_across_keyword_classes_and_findings() {
        let findings = vec![
            Finding::new("A coin rests inside the brass pot."),
            Finding::new("Another coin."),
            Finding::new("Only sand here."),
        ];
        let names: Vec<_> = keyword_fallback(&findings)
            .into_iter()
            .map(|r| r.name)
            .collect();

        assert_eq!(names, vec!["Coin", "Brass Pot", "Coin"]);
    }

    #[test]
    fn test_fallback_truncates_long_excerpts() {
        let long = format!("A bone {}", "x".repeat(200));
        let records = keyword_fallback(&[Finding::new(long)]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].additional_info.chars().count(), 103);
        assert!(records[0].additional_info.ends_with("..."));
    }

    #[tokio::test]
    async fn test_extract_requests_json_and_parses_answer() {
        let provider = ScriptedProvider::new(|_, config| {
            assert_eq!(config.response_format, ResponseFormat::JsonObject);
            Ok(format!(r#"{{"artifacts": [{}]}}"#, SWORD))
        });
        let extractor = ArtifactExtractor::new(provider, "gpt-4o");

        let records = extractor.extract(&[Finding::new("a sword")]).await;

        assert_eq!(records, vec![record("Sword")]);
    }

    #[tokio::test]
    async fn test_extract_falls_back_when_request_fails() {
        let extractor = ArtifactExtractor::new(ScriptedProvider::failing(), "gpt-4o");

        let records = extractor
            .extract(&[Finding::new("I can see a sword.")])
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Sword");
    }

    #[tokio::test]
    async fn test_extract_falls_back_when_answer_is_prose() {
        let provider = ScriptedProvider::new(|_, _| Ok("There is a bone.".to_string()));
        let extractor = ArtifactExtractor::new(provider, "gpt-4o");

        let records = extractor.extract(&[Finding::new("a bone")]).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Bone");
    }
}
