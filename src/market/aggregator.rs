use crate::config::config::MarketCfg;
use crate::core::error::AnalysisError;
use crate::core::types::{MarketSentiment, SentimentLabel};
use crate::sentiment::ensemble::EnsembleScorer;
use crate::sources::client::{NewsSource, SocialSource};
use futures::{StreamExt, stream};
use std::sync::Arc;
use tracing::{error, info};

const NEWS_WEIGHT: f64 = 0.6;
const SOCIAL_WEIGHT: f64 = 0.4;

/// Turns recent news and social chatter into one market-level verdict.
pub struct MarketAggregator {
    news: Arc<dyn NewsSource>,
    social: Arc<dyn SocialSource>,
    scorer: Arc<EnsembleScorer>,
    cfg: MarketCfg,
}

impl MarketAggregator {
    pub fn new(
        news: Arc<dyn NewsSource>,
        social: Arc<dyn SocialSource>,
        scorer: Arc<EnsembleScorer>,
        cfg: MarketCfg,
    ) -> Self {
        Self {
            news,
            social,
            scorer,
            cfg,
        }
    }

    /// Never fails: an aggregation-level error yields an `AnalysisError` verdict.
    pub async fn get_market_sentiment(&self) -> MarketSentiment {
        match self.try_market_sentiment().await {
            Ok(sentiment) => sentiment,
            Err(e) => {
                error!(?e, "Market sentiment aggregation failed");
                MarketSentiment::analysis_error()
            }
        }
    }

    pub async fn try_market_sentiment(&self) -> Result<MarketSentiment, AnalysisError> {
        let news = self
            .news
            .fetch(
                &self.cfg.news_query,
                self.cfg.news_window_hours,
                self.cfg.news_max_items,
            )
            .await;
        let posts = self
            .social
            .fetch(
                &self.cfg.social_query,
                self.cfg.social_window_hours,
                self.cfg.social_max_items,
            )
            .await;

        if news.is_empty() && posts.is_empty() {
            info!("No news or social items, nothing to score");
            return Ok(MarketSentiment::insufficient_data());
        }

        let news_scores = self
            .score_all(news.iter().map(|n| n.scoring_text()).collect())
            .await?;
        let social_scores = self
            .score_all(posts.iter().map(|p| p.text.clone()).collect())
            .await?;

        let sentiment = blend(&news_scores, &social_scores)?;
        info!(
            label = %sentiment.label,
            total = sentiment.total_score,
            news = news_scores.len(),
            social = social_scores.len(),
            "Market sentiment computed"
        );
        Ok(sentiment)
    }

    /// Scores each text on its own task, at most `concurrency` at a time,
    /// returning scores in input order.
    async fn score_all(&self, texts: Vec<String>) -> Result<Vec<f64>, AnalysisError> {
        let results: Vec<_> = stream::iter(texts)
            .map(|text| {
                let scorer = self.scorer.clone();
                tokio::spawn(async move { scorer.analyze_text(&text).await })
            })
            .buffered(self.cfg.concurrency.max(1))
            .collect()
            .await;

        results
            .into_iter()
            .map(|res| res.map(|score| score.score).map_err(AnalysisError::from))
            .collect()
    }
}

fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Averages each source, blends 60/40 news/social and labels the result.
pub fn blend(news_scores: &[f64], social_scores: &[f64]) -> Result<MarketSentiment, AnalysisError> {
    let news_average = mean(news_scores);
    let social_average = mean(social_scores);
    let total_score = NEWS_WEIGHT * news_average + SOCIAL_WEIGHT * social_average;

    if !total_score.is_finite() {
        return Err(AnalysisError::NonFinite(total_score));
    }

    Ok(MarketSentiment {
        label: SentimentLabel::classify(total_score),
        total_score,
        news_average,
        social_average,
        sources_analyzed: news_scores.len() + social_scores.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{FetchError, ScoreError};
    use crate::core::types::{ClassifierLabel, ClassifierOutput, NewsItem, SocialPost};
    use crate::sentiment::classifier::Classifier;
    use crate::sentiment::ensemble::EnsembleConfig;
    use crate::sentiment::lexical::LexicalScorer;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StubNews(Result<Vec<NewsItem>, ()>);

    #[async_trait]
    impl NewsSource for StubNews {
        async fn try_fetch(&self, _: &str, _: i64, _: usize) -> Result<Vec<NewsItem>, FetchError> {
            self.0
                .clone()
                .map_err(|_| FetchError::MissingCredential("stub"))
        }
    }

    struct StubSocial(Vec<SocialPost>);

    #[async_trait]
    impl SocialSource for StubSocial {
        async fn try_fetch(
            &self,
            _: &str,
            _: i64,
            _: usize,
        ) -> Result<Vec<SocialPost>, FetchError> {
            Ok(self.0.clone())
        }
    }

    /// Neutral for everything except texts containing `fail_on` (error) or
    /// `panic_on` (panics). Each call takes `delay`.
    #[derive(Default)]
    struct StubClassifier {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
        panic_on: Option<&'static str>,
        delay: Duration,
    }

    #[async_trait]
    impl Classifier for StubClassifier {
        async fn classify(&self, text: &str) -> Result<ClassifierOutput, ScoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.panic_on.is_some_and(|p| text.contains(p)) {
                panic!("classifier exploded");
            }
            if self.fail_on.is_some_and(|f| text.contains(f)) {
                return Err(ScoreError::Classifier("injected".to_string()));
            }
            Ok(ClassifierOutput {
                label: ClassifierLabel::Neutral,
                confidence: 0.99,
            })
        }
    }

    struct ZeroLexical;

    impl LexicalScorer for ZeroLexical {
        fn name(&self) -> &'static str {
            "zero"
        }
        fn score(&self, _: &str) -> Result<f64, ScoreError> {
            Ok(0.0)
        }
    }

    fn news(title: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            content: "session recap".to_string(),
            source: "Wire".to_string(),
            published_at: Utc::now(),
        }
    }

    fn post(text: &str) -> SocialPost {
        SocialPost {
            text: text.to_string(),
            like_count: 0,
            created_at: Utc::now(),
        }
    }

    fn aggregator(
        news_items: Result<Vec<NewsItem>, ()>,
        posts: Vec<SocialPost>,
        classifier: Arc<StubClassifier>,
    ) -> MarketAggregator {
        let scorer = Arc::new(EnsembleScorer::new(
            classifier,
            Arc::new(ZeroLexical),
            Arc::new(ZeroLexical),
            EnsembleConfig::default(),
        ));
        MarketAggregator::new(
            Arc::new(StubNews(news_items)),
            Arc::new(StubSocial(posts)),
            scorer,
            MarketCfg::default(),
        )
    }

    fn classifier() -> Arc<StubClassifier> {
        Arc::new(StubClassifier::default())
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_blend_worked_example() {
        let m = blend(&[0.4, 0.2], &[0.1]).unwrap();
        assert!(approx(m.news_average, 0.3));
        assert!(approx(m.social_average, 0.1));
        assert!(approx(m.total_score, 0.22));
        assert_eq!(m.label, SentimentLabel::Bullish);
        assert_eq!(m.sources_analyzed, 3);
    }

    #[test]
    fn test_blend_single_source() {
        let m = blend(&[], &[-0.9, -0.5]).unwrap();
        assert_eq!(m.news_average, 0.0);
        assert!(approx(m.total_score, 0.4 * -0.7));
        assert_eq!(m.label, SentimentLabel::StronglyBearish);
        assert_eq!(m.sources_analyzed, 2);
    }

    #[test]
    fn test_blend_rejects_non_finite() {
        assert!(matches!(
            blend(&[f64::NAN], &[]),
            Err(AnalysisError::NonFinite(_))
        ));
    }

    #[tokio::test]
    async fn test_no_items_is_insufficient_data_without_scoring() {
        let classifier = classifier();
        let agg = aggregator(Ok(vec![]), vec![], classifier.clone());

        let m = agg.get_market_sentiment().await;
        assert_eq!(m, MarketSentiment::insufficient_data());
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_news_fetch_counts_as_empty() {
        let classifier = classifier();
        let agg = aggregator(Err(()), vec![], classifier);

        let m = agg.get_market_sentiment().await;
        assert_eq!(m.label, SentimentLabel::InsufficientData);
    }

    #[tokio::test]
    async fn test_end_to_end_neutral_classifier_lands_on_boundary() {
        // every item scores 0.5 * 0.5 = 0.25, so the blend sits on the
        // StronglyBullish threshold and must not cross it
        let classifier = classifier();
        let agg = aggregator(
            Ok(vec![news("Quiet open"), news("Flat close")]),
            vec![post("nothing to see"), post("calm day"), post("steady")],
            classifier.clone(),
        );

        let m = agg.get_market_sentiment().await;
        assert_eq!(m.label, SentimentLabel::Bullish);
        assert!(approx(m.total_score, 0.25));
        assert!(approx(m.news_average, 0.25));
        assert!(approx(m.social_average, 0.25));
        assert_eq!(m.sources_analyzed, 5);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_one_failed_item_does_not_abort_batch() {
        let classifier = Arc::new(StubClassifier {
            fail_on: Some("broken"),
            ..Default::default()
        });
        let agg = aggregator(
            Ok(vec![news("Quiet open"), news("broken feed")]),
            vec![],
            classifier,
        );

        let m = agg.get_market_sentiment().await;
        // (0.25 + 0.0) / 2, news only
        assert!(approx(m.news_average, 0.125));
        assert!(approx(m.total_score, 0.6 * 0.125));
        assert_eq!(m.label, SentimentLabel::Neutral);
        assert_eq!(m.sources_analyzed, 2);
    }

    #[tokio::test]
    async fn test_panicking_scorer_becomes_analysis_error() {
        let classifier = Arc::new(StubClassifier {
            panic_on: Some("explode"),
            ..Default::default()
        });
        let agg = aggregator(Ok(vec![news("explode")]), vec![post("fine")], classifier);

        assert!(matches!(
            agg.try_market_sentiment().await,
            Err(AnalysisError::ScoringTask(_))
        ));
        assert_eq!(
            agg.get_market_sentiment().await,
            MarketSentiment::analysis_error()
        );
    }

    #[tokio::test]
    async fn test_duplicate_texts_in_one_batch_are_classified_once() {
        // slow enough that the default fan-out of 4 overlaps every item
        let classifier = Arc::new(StubClassifier {
            delay: Duration::from_millis(50),
            ..Default::default()
        });
        let agg = aggregator(
            Ok(vec![]),
            vec![
                post("same words"),
                post("same words"),
                post("same words"),
                post("other words"),
            ],
            classifier.clone(),
        );

        let m = agg.get_market_sentiment().await;
        assert_eq!(m.sources_analyzed, 4);
        assert!(approx(m.social_average, 0.25));
        assert_eq!(agg.scorer.cached_len(), 2);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
    }
}
