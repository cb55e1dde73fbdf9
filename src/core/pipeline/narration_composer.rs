use super::fallback::{FallbackChain, FallibleStrategy, StrategyError};
use super::pipeline_models::Finding;
use super::prompts::{narration_user_prompt, NARRATION_MAX_TOKENS, NARRATION_SYSTEM_PROMPT};
use crate::core::ai::{AiConfig, AiProvider, AiService, MessageContent};
use async_trait::async_trait;

/// Writes the spoken script for the presentation.
///
/// Strategies, in order: a styled script from the model, then the raw
/// findings separated by blank lines.
pub struct NarrationComposer {
    chain: FallbackChain<[Finding], String>,
}

impl NarrationComposer {
    pub fn new<P: AiProvider + 'static>(provider: P, model: impl Into<String>) -> Self {
        let config = AiConfig::new(model).with_max_tokens(NARRATION_MAX_TOKENS);
        let chain = FallbackChain::new()
            .then(StyledNarration {
                ai: AiService::new(provider, NARRATION_SYSTEM_PROMPT, config),
            })
            .then(JoinedFindings);
        Self { chain }
    }

    pub async fn compose(&self, findings: &[Finding]) -> String {
        match self.chain.run(findings).await {
            Ok(resolved) => {
                tracing::info!(strategy = resolved.strategy, "Narration ready");
                resolved.value
            }
            // JoinedFindings cannot fail, so this only happens on an empty chain.
            Err(_) => join_findings(findings),
        }
    }
}

fn join_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(Finding::as_str)
        .collect::<Vec<_>>()
        .join("\n\n")
}

struct StyledNarration<P: AiProvider> {
    ai: AiService<P>,
}

#[async_trait]
impl<P: AiProvider> FallibleStrategy<[Finding], String> for StyledNarration<P> {
    fn name(&self) -> &'static str {
        "styled-script"
    }

    async fn attempt(&self, findings: &[Finding]) -> Result<String, StrategyError> {
        let prompt = narration_user_prompt(findings);
        self.ai
            .complete(MessageContent::Text(prompt))
            .await
            .map_err(StrategyError::failed)
    }
}

struct JoinedFindings;

#[async_trait]
impl FallibleStrategy<[Finding], String> for JoinedFindings {
    fn name(&self) -> &'static str {
        "joined-findings"
    }

    async fn attempt(&self, findings: &[Finding]) -> Result<String, StrategyError> {
        Ok(join_findings(findings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ai::ai_service::testing::ScriptedProvider;

    fn findings() -> Vec<Finding> {
        vec![
            Finding::new("A sword near the rocks."),
            Finding::new("Two coins and a penny."),
        ]
    }

    #[tokio::test]
    async fn test_styled_script_is_used_when_model_answers() {
        let provider = ScriptedProvider::new(|messages, _| {
            assert!(messages[0].content.text().contains("7th grade"));
            assert!(messages[1]
                .content
                .text()
                .contains("Drone Photo 2: Two coins and a penny."));
            Ok("Hi, I'm going to tell you about our discovery!".to_string())
        });
        let composer = NarrationComposer::new(provider, "gpt-4o");

        let narration = composer.compose(&findings()).await;

        assert_eq!(narration, "Hi, I'm going to tell you about our discovery!");
    }

    #[tokio::test]
    async fn test_failed_model_call_joins_findings_with_blank_line() {
        let composer = NarrationComposer::new(ScriptedProvider::failing(), "gpt-4o");

        let narration = composer.compose(&findings()).await;

        assert_eq!(narration, "A sword near the rocks.\n\nTwo coins and a penny.");
        assert!(!narration.contains("Drone Photo"));
    }
}
