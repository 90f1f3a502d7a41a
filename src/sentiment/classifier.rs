use crate::config::config::ClassifierCfg;
use crate::core::error::ScoreError;
use crate::core::types::{ClassifierLabel, ClassifierOutput};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;

/// Pretrained text classifier returning positive / neutral / negative.
#[async_trait]
pub trait Classifier: Send + Sync + 'static {
    async fn classify(&self, text: &str) -> Result<ClassifierOutput, ScoreError>;
}

#[derive(Debug, Deserialize)]
struct Prediction {
    label: String,
    score: f64,
}

/// Accepts both `[[{label, score}, ..]]` and `[{label, score}, ..]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictionBody {
    Nested(Vec<Vec<Prediction>>),
    Flat(Vec<Prediction>),
}

/// Picks the highest-confidence prediction from a hosted text-classification response.
pub fn parse_prediction(body: &str) -> Result<ClassifierOutput, ScoreError> {
    let parsed: PredictionBody = serde_json::from_str(body)
        .map_err(|e| ScoreError::Classifier(format!("undecodable prediction: {}", e)))?;

    let predictions = match parsed {
        PredictionBody::Nested(mut outer) => {
            if outer.is_empty() {
                return Err(ScoreError::EmptyPrediction);
            }
            outer.swap_remove(0)
        }
        PredictionBody::Flat(inner) => inner,
    };

    let best = predictions
        .into_iter()
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
        .ok_or(ScoreError::EmptyPrediction)?;

    let label = ClassifierLabel::from_model(&best.label)
        .ok_or_else(|| ScoreError::UnknownLabel(best.label.clone()))?;

    Ok(ClassifierOutput {
        label,
        confidence: best.score,
    })
}

/// FinBERT served behind a hosted inference endpoint.
#[derive(Clone)]
pub struct FinBertClient {
    client: Client,
    cfg: ClassifierCfg,
    // shared by clones so the quota holds across the whole process
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl FinBertClient {
    pub fn new(cfg: ClassifierCfg, client: Client) -> Self {
        let rpm = NonZeroU32::new(cfg.rate_limit_rpm).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rpm)));

        Self {
            client,
            cfg,
            limiter,
        }
    }
}

#[async_trait]
impl Classifier for FinBertClient {
    async fn classify(&self, text: &str) -> Result<ClassifierOutput, ScoreError> {
        self.limiter.until_ready().await;

        debug!(url = %self.cfg.base_url, chars = text.chars().count(), "Calling classifier");

        let mut req = self
            .client
            .post(&self.cfg.base_url)
            .json(&json!({ "inputs": text }));
        if !self.cfg.api_key.is_empty() {
            req = req.bearer_auth(&self.cfg.api_key);
        }

        let res = req.send().await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ScoreError::Status { status, body });
        }

        let body = res.text().await?;
        parse_prediction(&body)
    }
}
