// =============================================================================
// FALLBACK CHAIN
// =============================================================================
//
// Several stages follow the same shape: try method A, if it fails try method
// B, and finally hand back something usable. Rather than nesting error
// handlers, each method is a `FallibleStrategy` and a `FallbackChain` runs
// them in order. The first success wins; failures are logged and collected.

use async_trait::async_trait;
use std::fmt;

/// One way of turning an input into an output that may fail.
#[async_trait]
pub trait FallibleStrategy<I: ?Sized + Sync, O: Send>: Send + Sync {
    /// Short label used in logs ("sips", "image-crate", "model", ...).
    fn name(&self) -> &'static str;

    async fn attempt(&self, input: &I) -> Result<O, StrategyError>;
}

/// Why a single strategy gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    /// The strategy does not apply to this input (e.g. HEIC-only loader on a PNG).
    NotApplicable,
    Failed(String),
}

impl StrategyError {
    pub fn failed(e: impl fmt::Display) -> Self {
        StrategyError::Failed(e.to_string())
    }
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyError::NotApplicable => write!(f, "not applicable"),
            StrategyError::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

/// Output of a successful chain run and the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<O> {
    pub value: O,
    pub strategy: &'static str,
}

/// Every strategy failed. Holds `(strategy name, error)` in attempt order.
#[derive(Debug, thiserror::Error)]
#[error("all {} strategies failed", .failures.len())]
pub struct ChainExhausted {
    pub failures: Vec<(&'static str, StrategyError)>,
}

pub struct FallbackChain<I: ?Sized + Sync, O: Send> {
    strategies: Vec<Box<dyn FallibleStrategy<I, O>>>,
}

impl<I: ?Sized + Sync, O: Send> FallbackChain<I, O> {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    pub fn then(mut self, strategy: impl FallibleStrategy<I, O> + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Strategy names in attempt order.
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Runs strategies in order and returns the first success.
    pub async fn run(&self, input: &I) -> Result<Resolved<O>, ChainExhausted> {
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            match strategy.attempt(input).await {
                Ok(value) => {
                    return Ok(Resolved {
                        value,
                        strategy: strategy.name(),
                    })
                }
                Err(StrategyError::NotApplicable) => {
                    tracing::trace!(strategy = strategy.name(), "Strategy skipped");
                    failures.push((strategy.name(), StrategyError::NotApplicable));
                }
                Err(e) => {
                    tracing::warn!(strategy = strategy.name(), "Strategy failed: {}", e);
                    failures.push((strategy.name(), e));
                }
            }
        }

        Err(ChainExhausted { failures })
    }
}

impl<I: ?Sized + Sync, O: Send> Default for FallbackChain<I, O> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed {
        name: &'static str,
        result: Result<u32, StrategyError>,
        hits: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FallibleStrategy<str, u32> for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn attempt(&self, _input: &str) -> Result<u32, StrategyError> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn fixed(name: &'static str, result: Result<u32, StrategyError>) -> (Fixed, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        (
            Fixed {
                name,
                result,
                hits: hits.clone(),
            },
            hits,
        )
    }

    #[tokio::test]
    async fn test_first_success_wins_and_later_strategies_are_not_run() {
        let (a, a_hits) = fixed("a", Err(StrategyError::failed("boom")));
        let (b, b_hits) = fixed("b", Ok(2));
        let (c, c_hits) = fixed("c", Ok(3));
        let chain = FallbackChain::new().then(a).then(b).then(c);

        let resolved = chain.run("input").await.unwrap();

        assert_eq!(resolved.value, 2);
        assert_eq!(resolved.strategy, "b");
        assert_eq!(a_hits.load(Ordering::SeqCst), 1);
        assert_eq!(b_hits.load(Ordering::SeqCst), 1);
        assert_eq!(c_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhausted_chain_reports_every_failure_in_order() {
        let (a, _) = fixed("a", Err(StrategyError::NotApplicable));
        let (b, _) = fixed("b", Err(StrategyError::failed("timed out")));
        let chain = FallbackChain::new().then(a).then(b);

        let err = chain.run("input").await.unwrap_err();

        assert_eq!(
            err.failures,
            vec![
                ("a", StrategyError::NotApplicable),
                ("b", StrategyError::Failed("timed out".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_chain_is_exhausted() {
        let chain: FallbackChain<str, u32> = FallbackChain::new();
        assert!(chain.names().is_empty());
        assert!(chain.run("x").await.is_err());
    }
}
