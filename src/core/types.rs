use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ----------- Text scoring -----------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierLabel {
    Positive,
    Neutral,
    Negative,
    Error,
}

impl ClassifierLabel {
    /// Fixed numeric proxy blended into the ensemble in place of the label.
    pub fn signal(self) -> f64 {
        match self {
            ClassifierLabel::Positive => 0.8,
            ClassifierLabel::Neutral => 0.5,
            ClassifierLabel::Negative => -0.8,
            ClassifierLabel::Error => 0.0,
        }
    }

    /// Parses a label emitted by the classifier. `error` is never produced by a model.
    pub fn from_model(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(ClassifierLabel::Positive),
            "neutral" => Some(ClassifierLabel::Neutral),
            "negative" => Some(ClassifierLabel::Negative),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassifierOutput {
    pub label: ClassifierLabel,
    pub confidence: f64,
}

/// Ensemble result for one text, with every component kept for inspection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextScore {
    pub score: f64,
    pub classifier_label: ClassifierLabel,
    pub classifier_confidence: f64,
    /// General-purpose compound score (VADER).
    pub lexical_a: f64,
    /// Averaged word polarity score.
    pub lexical_b: f64,
    /// Financial lexicon score, already scaled by 0.3.
    pub lexicon: f64,
}

impl TextScore {
    /// Sentinel returned when any scoring component fails.
    pub fn error() -> Self {
        Self {
            score: 0.0,
            classifier_label: ClassifierLabel::Error,
            classifier_confidence: 0.0,
            lexical_a: 0.0,
            lexical_b: 0.0,
            lexicon: 0.0,
        }
    }

    pub fn is_error(&self) -> bool {
        self.classifier_label == ClassifierLabel::Error
    }
}

// ----------- Source items -----------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub content: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

impl NewsItem {
    /// Text handed to the ensemble scorer.
    pub fn scoring_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub text: String,
    pub like_count: u64,
    pub created_at: DateTime<Utc>,
}

// ----------- Market verdict -----------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    StronglyBullish,
    Bullish,
    Neutral,
    Bearish,
    StronglyBearish,
    InsufficientData,
    AnalysisError,
}

impl SentimentLabel {
    /// First matching threshold wins; all comparisons are strict.
    pub fn classify(total_score: f64) -> Self {
        if total_score > 0.25 {
            SentimentLabel::StronglyBullish
        } else if total_score > 0.08 {
            SentimentLabel::Bullish
        } else if total_score < -0.25 {
            SentimentLabel::StronglyBearish
        } else if total_score < -0.08 {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentimentLabel::StronglyBullish => "STRONGLY BULLISH",
            SentimentLabel::Bullish => "Bullish",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Bearish => "Bearish",
            SentimentLabel::StronglyBearish => "STRONGLY BEARISH",
            SentimentLabel::InsufficientData => "Insufficient data",
            SentimentLabel::AnalysisError => "Analysis error",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarketSentiment {
    pub label: SentimentLabel,
    pub total_score: f64,
    pub news_average: f64,
    pub social_average: f64,
    pub sources_analyzed: usize,
}

impl MarketSentiment {
    pub fn insufficient_data() -> Self {
        Self::empty(SentimentLabel::InsufficientData)
    }

    pub fn analysis_error() -> Self {
        Self::empty(SentimentLabel::AnalysisError)
    }

    fn empty(label: SentimentLabel) -> Self {
        Self {
            label,
            total_score: 0.0,
            news_average: 0.0,
            social_average: 0.0,
            sources_analyzed: 0,
        }
    }
}
