use crate::config::config::{ClassifierCfg, ScorerCfg};
use crate::core::error::ScoreError;
use crate::core::text::truncate_chars;
use crate::core::types::TextScore;
use crate::sentiment::classifier::Classifier;
use crate::sentiment::lexical::LexicalScorer;
use crate::sentiment::lexicon::lexicon_score;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

const CLASSIFIER_WEIGHT: f64 = 0.5;
const LEXICAL_A_WEIGHT: f64 = 0.3;
const LEXICAL_B_WEIGHT: f64 = 0.1;
const LEXICON_WEIGHT: f64 = 0.1;
/// Scale applied to the raw lexicon score before blending.
const LEXICON_SCALE: f64 = 0.3;

const DEFAULT_CACHE_CAPACITY: NonZeroUsize =
    NonZeroUsize::new(512).expect("cache capacity can't be 0");

type ScoreSlot = Arc<OnceCell<TextScore>>;

#[derive(Debug, Clone)]
pub struct EnsembleConfig {
    pub cache_capacity: NonZeroUsize,
    /// Characters of input the classifier sees. Lexical scorers get the full text.
    pub classifier_max_chars: usize,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            classifier_max_chars: 1024,
        }
    }
}

impl EnsembleConfig {
    pub fn from_cfg(scorer: &ScorerCfg, classifier: &ClassifierCfg) -> Self {
        Self {
            cache_capacity: NonZeroUsize::new(scorer.cache_capacity).unwrap_or(NonZeroUsize::MIN),
            classifier_max_chars: classifier.max_chars,
        }
    }
}

/// Blends a classifier signal, two lexical scores and the financial lexicon
/// into one polarity value.
///
/// Results are memoized per exact input text in a bounded LRU cache. Each
/// entry is a slot that the first caller fills; concurrent callers with the
/// same text wait on that slot, so a text reaches the classifier at most once
/// while it stays cached. Sentinel scores are cached too, so repeated calls
/// with the same text always agree.
pub struct EnsembleScorer {
    classifier: Arc<dyn Classifier>,
    lexical_a: Arc<dyn LexicalScorer>,
    lexical_b: Arc<dyn LexicalScorer>,
    classifier_max_chars: usize,
    cache: Mutex<LruCache<String, ScoreSlot>>,
}

impl EnsembleScorer {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        lexical_a: Arc<dyn LexicalScorer>,
        lexical_b: Arc<dyn LexicalScorer>,
        config: EnsembleConfig,
    ) -> Self {
        Self {
            classifier,
            lexical_a,
            lexical_b,
            classifier_max_chars: config.classifier_max_chars,
            cache: Mutex::new(LruCache::new(config.cache_capacity)),
        }
    }

    /// Never fails: any scoring error yields `TextScore::error()`.
    pub async fn analyze_text(&self, text: &str) -> TextScore {
        let slot = self.slot(text);
        if slot.initialized() {
            debug!("Text score cache hit");
        }

        slot.get_or_init(|| async {
            match self.try_analyze(text).await {
                Ok(score) => score,
                Err(e) => {
                    warn!(?e, "Scoring failed, degrading to neutral sentinel");
                    TextScore::error()
                }
            }
        })
        .await
        .clone()
    }

    /// Uncached scoring with the failure category preserved.
    pub async fn try_analyze(&self, text: &str) -> Result<TextScore, ScoreError> {
        let prediction = self
            .classifier
            .classify(truncate_chars(text, self.classifier_max_chars))
            .await?;
        let classifier_signal = prediction.label.signal();

        let lexical_a = finite(self.lexical_a.name(), self.lexical_a.score(text)?)?;
        let lexical_b = finite(self.lexical_b.name(), self.lexical_b.score(text)?)?;
        let lexicon = lexicon_score(text) * LEXICON_SCALE;

        let score = CLASSIFIER_WEIGHT * classifier_signal
            + LEXICAL_A_WEIGHT * lexical_a
            + LEXICAL_B_WEIGHT * lexical_b
            + LEXICON_WEIGHT * lexicon;

        Ok(TextScore {
            score: finite("ensemble", score)?,
            classifier_label: prediction.label,
            classifier_confidence: prediction.confidence,
            lexical_a,
            lexical_b,
            lexicon,
        })
    }

    pub fn cached_len(&self) -> usize {
        self.lock_cache().len()
    }

    /// Slot for `text`, created empty on a miss. Touching it refreshes its
    /// LRU position. An evicted slot still completes for callers already
    /// holding it.
    fn slot(&self, text: &str) -> ScoreSlot {
        let mut cache = self.lock_cache();
        if let Some(slot) = cache.get(text) {
            return slot.clone();
        }
        let slot = ScoreSlot::default();
        cache.put(text.to_string(), slot.clone());
        slot
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, LruCache<String, ScoreSlot>> {
        // entries are whole slots, a poisoned guard still holds a consistent map
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn finite(component: &'static str, value: f64) -> Result<f64, ScoreError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScoreError::NonFinite(component))
    }
}
