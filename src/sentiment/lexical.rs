use crate::core::error::ScoreError;
use std::panic::{AssertUnwindSafe, catch_unwind};
use vader_sentiment::SentimentIntensityAnalyzer;

/// General-purpose text polarity, roughly in [-1, 1].
pub trait LexicalScorer: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    fn score(&self, text: &str) -> Result<f64, ScoreError>;
}

/// VADER compound score.
pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalScorer for VaderScorer {
    fn name(&self) -> &'static str {
        "vader"
    }

    fn score(&self, text: &str) -> Result<f64, ScoreError> {
        if text.trim().is_empty() {
            return Ok(0.0);
        }

        // the analyzer indexes into its token buffers and can panic on odd input
        let scores = catch_unwind(AssertUnwindSafe(|| self.analyzer.polarity_scores(text)))
            .map_err(|_| ScoreError::Lexical {
                scorer: self.name(),
                reason: "analyzer panicked".to_string(),
            })?;

        scores
            .get("compound")
            .copied()
            .ok_or_else(|| ScoreError::Lexical {
                scorer: self.name(),
                reason: "no compound score".to_string(),
            })
    }
}
