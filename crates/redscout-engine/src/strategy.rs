//! Ordered fallback chains.
//!
//! Every read and write against the page is expressed as a `StrategyChain`:
//! strategies run strictly in priority order, the first candidate that its own
//! strategy accepts wins, and nothing after it runs. A strategy that errors is
//! logged and skipped, so one broken selector never fails the whole chain.

use async_trait::async_trait;
use redscout_common::{Backend, BackendError};
use std::time::Instant;
use tracing::debug;

#[async_trait]
pub trait Strategy<T: Send>: Send + Sync {
    /// Stable identifier, recorded as provenance when this strategy wins.
    fn name(&self) -> &str;

    /// Produce a candidate, or `None` when this strategy found nothing.
    async fn probe(&self, backend: &mut dyn Backend) -> Result<Option<T>, BackendError>;

    fn accept(&self, _candidate: &T) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Found<T> {
    pub value: T,
    /// Position of the winning strategy in its chain.
    pub index: usize,
    pub strategy: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<T> {
    Found(Found<T>),
    Unknown,
}

impl<T> Resolved<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolved::Found(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Resolved::Found(found) => Some(&found.value),
            Resolved::Unknown => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Resolved::Found(found) => Some(found.value),
            Resolved::Unknown => None,
        }
    }

    pub fn strategy(&self) -> Option<&str> {
        match self {
            Resolved::Found(found) => Some(&found.strategy),
            Resolved::Unknown => None,
        }
    }
}

pub struct StrategyChain<T> {
    label: String,
    strategies: Vec<Box<dyn Strategy<T>>>,
}

impl<T: Send + 'static> StrategyChain<T> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            strategies: Vec::new(),
        }
    }

    pub fn with(mut self, strategy: impl Strategy<T> + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn push(&mut self, strategy: Box<dyn Strategy<T>>) {
        self.strategies.push(strategy);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub async fn resolve(&self, backend: &mut dyn Backend) -> Resolved<T> {
        for (index, strategy) in self.strategies.iter().enumerate() {
            let started = Instant::now();
            let outcome = strategy.probe(backend).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(Some(candidate)) => {
                    if strategy.accept(&candidate) {
                        debug!(
                            chain = %self.label,
                            strategy = strategy.name(),
                            index,
                            elapsed_ms,
                            "accepted"
                        );
                        return Resolved::Found(Found {
                            value: candidate,
                            index,
                            strategy: strategy.name().to_string(),
                        });
                    }
                    debug!(
                        chain = %self.label,
                        strategy = strategy.name(),
                        elapsed_ms,
                        "rejected"
                    );
                }
                Ok(None) => {
                    debug!(
                        chain = %self.label,
                        strategy = strategy.name(),
                        elapsed_ms,
                        "no candidate"
                    );
                }
                Err(e) => {
                    debug!(
                        chain = %self.label,
                        strategy = strategy.name(),
                        elapsed_ms,
                        error = %e,
                        "strategy failed"
                    );
                }
            }
        }

        debug!(chain = %self.label, "no strategy accepted");
        Resolved::Unknown
    }
}

/// Length bounds on trimmed text, counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRule {
    longer_than: usize,
    shorter_than: Option<usize>,
}

impl TextRule {
    pub const NON_EMPTY: TextRule = TextRule {
        longer_than: 0,
        shorter_than: None,
    };

    pub const fn longer_than(chars: usize) -> Self {
        Self {
            longer_than: chars,
            shorter_than: None,
        }
    }

    pub const fn shorter_than(self, chars: usize) -> Self {
        Self {
            longer_than: self.longer_than,
            shorter_than: Some(chars),
        }
    }

    pub fn accepts(&self, text: &str) -> bool {
        let len = text.trim().chars().count();
        len > self.longer_than && self.shorter_than.map_or(true, |max| len < max)
    }
}

/// Ranking rule for the "longest text" heuristics: the longest candidate by
/// character count wins, and on a tie the one seen first (document order).
pub fn longest_text<I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    let mut best: Option<(usize, String)> = None;
    for text in candidates {
        let len = text.chars().count();
        if best.as_ref().map_or(true, |(best_len, _)| len > *best_len) {
            best = Some((len, text));
        }
    }
    best.map(|(_, text)| text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rule_counts_characters_not_bytes() {
        let rule = TextRule::longer_than(3);
        assert!(rule.accepts("  四个汉字  "));
        assert!(!rule.accepts("三个字"));
        assert!(!TextRule::NON_EMPTY.accepts("   "));
    }

    #[test]
    fn text_rule_upper_bound_is_exclusive() {
        let rule = TextRule::longer_than(1).shorter_than(4);
        assert!(rule.accepts("abc"));
        assert!(!rule.accepts("abcd"));
    }

    #[test]
    fn longest_text_prefers_document_order_on_ties() {
        let picked = longest_text(vec![
            "short".to_string(),
            "first-long".to_string(),
            "later-long".to_string(),
        ]);
        assert_eq!(picked.as_deref(), Some("first-long"));
        assert_eq!(longest_text(Vec::<String>::new()), None);
    }
}
