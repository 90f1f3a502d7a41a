use thiserror::Error;

/// Upstream unavailable. Fetchers turn every variant into an empty result.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0} credential not configured")]
    MissingCredential(&'static str),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("undecodable response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Scoring failure. The ensemble turns every variant into the sentinel score.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("classifier request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("classifier returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("classifier returned no prediction")]
    EmptyPrediction,
    #[error("classifier returned unknown label {0:?}")]
    UnknownLabel(String),
    #[error("classifier failed: {0}")]
    Classifier(String),
    #[error("lexical scorer {scorer} failed: {reason}")]
    Lexical { scorer: &'static str, reason: String },
    #[error("{0} produced a non-finite value")]
    NonFinite(&'static str),
}

/// Aggregation-level failure. Reported to callers as an `AnalysisError` verdict.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("scoring task failed: {0}")]
    ScoringTask(#[from] tokio::task::JoinError),
    #[error("blended score is not finite: {0}")]
    NonFinite(f64),
}
