use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppCfg {
    #[serde(default)]
    pub http: HttpCfg,
    #[serde(default)]
    pub rate_limit: RateLimitCfg,
    #[serde(default)]
    pub news: NewsCfg,
    #[serde(default)]
    pub social: SocialCfg,
    #[serde(default)]
    pub classifier: ClassifierCfg,
    #[serde(default)]
    pub scorer: ScorerCfg,
    #[serde(default)]
    pub market: MarketCfg,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpCfg {
    #[serde(default = "default_ua")]
    pub user_agent: String,
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_pool_idle")]
    pub pool_idle_timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_keep_alive")]
    pub tcp_keep_alive: Duration,
    #[serde(default = "default_pool")]
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            user_agent: default_ua(),
            timeout: default_timeout(),
            pool_idle_timeout: default_pool_idle(),
            tcp_keep_alive: default_keep_alive(),
            pool_max_idle_per_host: default_pool(),
        }
    }
}
fn default_ua() -> String {
    "market_mood/0.1".into()
}
fn default_timeout() -> Duration {
    Duration::from_secs(10)
}
fn default_pool_idle() -> Duration {
    Duration::from_secs(90)
}
fn default_keep_alive() -> Duration {
    Duration::from_secs(60)
}
fn default_pool() -> usize {
    16
}

/// Cooldown shared by every outbound call to a news or social service.
#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitCfg {
    #[serde(with = "humantime_serde", default = "default_cooldown")]
    pub cooldown: Duration,
}

impl Default for RateLimitCfg {
    fn default() -> Self {
        Self {
            cooldown: default_cooldown(),
        }
    }
}
fn default_cooldown() -> Duration {
    Duration::from_millis(1200)
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewsCfg {
    #[serde(default = "default_news_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_content_chars")]
    pub content_chars: usize,
}

impl Default for NewsCfg {
    fn default() -> Self {
        Self {
            base_url: default_news_url(),
            api_key: "".to_string(),
            content_chars: default_content_chars(),
        }
    }
}
fn default_news_url() -> String {
    "https://newsapi.org/v2/everything".to_string()
}
fn default_content_chars() -> usize {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct SocialCfg {
    #[serde(default = "default_social_url")]
    pub base_url: String,
    #[serde(default)]
    pub bearer_token: String,
}

impl Default for SocialCfg {
    fn default() -> Self {
        Self {
            base_url: default_social_url(),
            bearer_token: "".to_string(),
        }
    }
}
fn default_social_url() -> String {
    "https://api.twitter.com/2/tweets/search/recent".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierCfg {
    #[serde(default = "default_classifier_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_rpm")]
    pub rate_limit_rpm: u32,
}

impl Default for ClassifierCfg {
    fn default() -> Self {
        Self {
            base_url: default_classifier_url(),
            api_key: "".to_string(),
            max_chars: default_max_chars(),
            rate_limit_rpm: default_rpm(),
        }
    }
}
fn default_classifier_url() -> String {
    "https://api-inference.huggingface.co/models/ProsusAI/finbert".to_string()
}
fn default_max_chars() -> usize {
    1024
}
fn default_rpm() -> u32 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScorerCfg {
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for ScorerCfg {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
        }
    }
}
fn default_cache_capacity() -> usize {
    512
}

/// What one market-level aggregation pulls from each source.
#[derive(Debug, Deserialize, Clone)]
pub struct MarketCfg {
    #[serde(default = "default_news_query")]
    pub news_query: String,
    #[serde(default = "default_window_hours")]
    pub news_window_hours: i64,
    #[serde(default = "default_news_max")]
    pub news_max_items: usize,
    #[serde(default = "default_social_query")]
    pub social_query: String,
    #[serde(default = "default_window_hours")]
    pub social_window_hours: i64,
    #[serde(default = "default_social_max")]
    pub social_max_items: usize,
    /// Items scored in parallel during one aggregation.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for MarketCfg {
    fn default() -> Self {
        Self {
            news_query: default_news_query(),
            news_window_hours: default_window_hours(),
            news_max_items: default_news_max(),
            social_query: default_social_query(),
            social_window_hours: default_window_hours(),
            social_max_items: default_social_max(),
            concurrency: default_concurrency(),
        }
    }
}
fn default_news_query() -> String {
    "Bitcoin".to_string()
}
fn default_social_query() -> String {
    "Bitcoin OR BTC".to_string()
}
fn default_window_hours() -> i64 {
    24
}
fn default_news_max() -> usize {
    15
}
fn default_social_max() -> usize {
    30
}
fn default_concurrency() -> usize {
    4
}

impl AppCfg {
    pub fn load(path: &str) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(config::Environment::default().separator("__"))
            .build()
            .context("building config")?;

        let mut app: AppCfg = cfg.try_deserialize().context("deserializing config")?;
        app.fill_credentials_from_env();
        app.validate()?;
        Ok(app)
    }

    /// Conventional credential variables win only when the config left the field empty.
    fn fill_credentials_from_env(&mut self) {
        fill_from_env(&mut self.news.api_key, "NEWS_API_KEY");
        fill_from_env(&mut self.social.bearer_token, "TWITTER_BEARER_TOKEN");
        fill_from_env(&mut self.classifier.api_key, "HF_API_TOKEN");
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.news.base_url.is_empty(), "news.base_url missing");
        anyhow::ensure!(!self.social.base_url.is_empty(), "social.base_url missing");
        anyhow::ensure!(
            !self.classifier.base_url.is_empty(),
            "classifier.base_url missing"
        );
        anyhow::ensure!(
            self.classifier.max_chars > 0,
            "classifier.max_chars must be > 0"
        );
        anyhow::ensure!(
            self.classifier.rate_limit_rpm > 0,
            "classifier.rate_limit_rpm must be > 0"
        );
        anyhow::ensure!(
            self.scorer.cache_capacity > 0,
            "scorer.cache_capacity must be > 0"
        );
        anyhow::ensure!(self.market.concurrency > 0, "market.concurrency must be > 0");
        anyhow::ensure!(
            self.market.news_window_hours > 0 && self.market.social_window_hours > 0,
            "market window hours must be > 0"
        );
        anyhow::ensure!(
            (10..=100).contains(&self.market.social_max_items),
            "market.social_max_items must be within 10..=100"
        );
        Ok(())
    }
}

fn fill_from_env(field: &mut String, var: &str) {
    if field.is_empty() {
        if let Ok(v) = std::env::var(var) {
            *field = v;
        }
    }
}
