use crate::config::config::SocialCfg;
use crate::core::error::FetchError;
use crate::core::types::SocialPost;
use crate::ratelimit::cooldown::CooldownLimiter;
use crate::sources::client::SocialSource;
use crate::sources::recency::{parse_timestamp, within_window};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Page size limits of the recent-search endpoint.
const MIN_RESULTS: usize = 10;
const MAX_RESULTS: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    // absent when nothing matched
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawTweet {
    text: String,
    created_at: String,
    public_metrics: RawMetrics,
}

#[derive(Debug, Deserialize)]
struct RawMetrics {
    like_count: u64,
}

/// Turns a recent-search body into posts inside the recency window, keeping
/// at most `max_items`.
pub fn parse_tweets(
    body: &str,
    now: DateTime<Utc>,
    window_hours: i64,
    max_items: usize,
) -> Result<Vec<SocialPost>, FetchError> {
    let resp: SearchResponse = serde_json::from_str(body)?;

    let posts = resp
        .data
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<RawTweet>(value) {
            Ok(raw) => Some(raw),
            Err(e) => {
                debug!(?e, "Skipping malformed post");
                None
            }
        })
        .filter_map(|raw| {
            let created_at = parse_timestamp(&raw.created_at)?;
            Some(SocialPost {
                text: raw.text,
                like_count: raw.public_metrics.like_count,
                created_at,
            })
        })
        .filter(|post| within_window(post.created_at, now, window_hours))
        .take(max_items)
        .collect();

    Ok(posts)
}

/// Search expression sent upstream: originals only, English only.
pub fn search_expression(query: &str) -> String {
    format!("{} -is:retweet lang:en", query)
}

/// Social Fetcher backed by the X/Twitter v2 recent-search endpoint.
pub struct TwitterFetcher {
    client: Client,
    cfg: SocialCfg,
    limiter: Arc<CooldownLimiter>,
}

impl TwitterFetcher {
    pub fn new(cfg: SocialCfg, client: Client, limiter: Arc<CooldownLimiter>) -> Self {
        Self {
            client,
            cfg,
            limiter,
        }
    }
}

#[async_trait]
impl SocialSource for TwitterFetcher {
    async fn try_fetch(
        &self,
        query: &str,
        window_hours: i64,
        max_items: usize,
    ) -> Result<Vec<SocialPost>, FetchError> {
        if self.cfg.bearer_token.is_empty() {
            return Err(FetchError::MissingCredential("social bearer token"));
        }

        self.limiter.await_slot().await;

        let max_results = max_items.clamp(MIN_RESULTS, MAX_RESULTS);
        let res = self
            .client
            .get(&self.cfg.base_url)
            .bearer_auth(&self.cfg.bearer_token)
            .query(&[
                ("query", search_expression(query)),
                ("max_results", max_results.to_string()),
                ("tweet.fields", "created_at,public_metrics".to_string()),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = res.text().await?;
        let posts = parse_tweets(&body, Utc::now(), window_hours, max_items)?;
        info!(count = posts.len(), %query, "Fetched social posts");
        Ok(posts)
    }
}
