use crate::config::config::NewsCfg;
use crate::core::error::FetchError;
use crate::core::text::truncate_chars;
use crate::core::types::NewsItem;
use crate::ratelimit::cooldown::CooldownLimiter;
use crate::sources::client::NewsSource;
use crate::sources::recency::{parse_timestamp, within_window};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    content: Option<String>,
    source: Option<RawSource>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

/// Turns an `/v2/everything` body into news items inside the recency window.
/// Articles with a missing field or an unparseable timestamp are skipped.
pub fn parse_articles(
    body: &str,
    now: DateTime<Utc>,
    window_hours: i64,
    content_chars: usize,
) -> Result<Vec<NewsItem>, FetchError> {
    let resp: EverythingResponse = serde_json::from_str(body)?;

    let mut out = Vec::with_capacity(resp.articles.len());
    for value in resp.articles {
        let raw: RawArticle = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(?e, "Skipping malformed article");
                continue;
            }
        };

        let Some(title) = raw.title else {
            debug!("Skipping article without title");
            continue;
        };
        let Some(source) = raw.source.and_then(|s| s.name) else {
            debug!(%title, "Skipping article without source name");
            continue;
        };
        let Some(published_at) = raw.published_at.as_deref().and_then(parse_timestamp) else {
            debug!(%title, "Skipping article with unparseable timestamp");
            continue;
        };
        if !within_window(published_at, now, window_hours) {
            continue;
        }

        let content = raw
            .content
            .as_deref()
            .map(|c| truncate_chars(c, content_chars).to_string())
            .unwrap_or_default();

        out.push(NewsItem {
            title,
            content,
            source,
            published_at,
        });
    }

    Ok(out)
}

/// News Fetcher backed by newsapi.org.
pub struct NewsApiFetcher {
    client: Client,
    cfg: NewsCfg,
    limiter: Arc<CooldownLimiter>,
}

impl NewsApiFetcher {
    pub fn new(cfg: NewsCfg, client: Client, limiter: Arc<CooldownLimiter>) -> Self {
        Self {
            client,
            cfg,
            limiter,
        }
    }
}

#[async_trait]
impl NewsSource for NewsApiFetcher {
    async fn try_fetch(
        &self,
        query: &str,
        window_hours: i64,
        max_items: usize,
    ) -> Result<Vec<NewsItem>, FetchError> {
        if self.cfg.api_key.is_empty() {
            return Err(FetchError::MissingCredential("news api key"));
        }

        self.limiter.await_slot().await;

        let res = self
            .client
            .get(&self.cfg.base_url)
            .query(&[
                ("q", query),
                ("pageSize", &max_items.to_string()),
                ("apiKey", &self.cfg.api_key),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = res.text().await?;
        let items = parse_articles(&body, Utc::now(), window_hours, self.cfg.content_chars)?;
        info!(count = items.len(), %query, "Fetched news");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::stub_server::{local_client, refused_url, serve_status};
    use chrono::TimeZone;
    use std::time::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    const BODY: &str = r#"{
        "status": "ok",
        "totalResults": 5,
        "articles": [
            {"source": {"id": null, "name": "CoinDesk"}, "title": "Bitcoin rallies",
             "content": "Bulls are back.", "publishedAt": "2026-03-02T08:00:00Z"},
            {"source": {"id": null, "name": "Reuters"}, "title": "Old story",
             "content": "Stale.", "publishedAt": "2026-02-27T08:00:00Z"},
            {"source": {"id": null, "name": "Decrypt"}, "title": "No date",
             "content": "x", "publishedAt": "sometime"},
            {"source": {"id": null, "name": "The Block"}, "title": "Null content",
             "content": null, "publishedAt": "2026-03-02T11:00:00Z"},
            {"source": {"id": null}, "title": "Nameless source",
             "content": "y", "publishedAt": "2026-03-02T11:00:00Z"},
            "not-an-object"
        ]
    }"#;

    #[test]
    fn test_parse_filters_and_normalizes() {
        let items = parse_articles(BODY, now(), 24, 1000).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "Bitcoin rallies");
        assert_eq!(items[0].source, "CoinDesk");
        assert_eq!(items[0].content, "Bulls are back.");
        assert_eq!(items[0].scoring_text(), "Bitcoin rallies Bulls are back.");

        assert_eq!(items[1].title, "Null content");
        assert_eq!(items[1].content, "");
    }

    #[test]
    fn test_parse_truncates_content() {
        let long = "a".repeat(1500);
        let body = format!(
            r#"{{"articles":[{{"source":{{"name":"S"}},"title":"T","content":"{}","publishedAt":"2026-03-02T11:00:00Z"}}]}}"#,
            long
        );
        let items = parse_articles(&body, now(), 24, 1000).unwrap();
        assert_eq!(items[0].content.chars().count(), 1000);
    }

    #[test]
    fn test_parse_missing_articles_is_empty() {
        let items = parse_articles(r#"{"status":"ok"}"#, now(), 24, 1000).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_parse_with_unbounded_window() {
        let items = parse_articles(BODY, now(), i64::MAX, 1000).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].title, "Old story");
    }

    #[test]
    fn test_parse_garbage_is_decode_error() {
        assert!(matches!(
            parse_articles("<html>", now(), 24, 1000),
            Err(FetchError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_skips_call_and_slot() {
        let limiter = Arc::new(CooldownLimiter::new(Duration::from_secs(3600)));
        let fetcher = NewsApiFetcher::new(NewsCfg::default(), Client::new(), limiter.clone());

        assert!(matches!(
            fetcher.try_fetch("Bitcoin", 24, 15).await,
            Err(FetchError::MissingCredential(_))
        ));
        assert!(fetcher.fetch("Bitcoin", 24, 15).await.is_empty());

        // the hour-long cooldown would hang here had a slot been consumed
        tokio::time::timeout(Duration::from_millis(100), limiter.await_slot())
            .await
            .expect("no slot consumed");
    }

    fn keyed_fetcher(base_url: String) -> NewsApiFetcher {
        let cfg = NewsCfg {
            base_url,
            api_key: "test-key".to_string(),
            ..NewsCfg::default()
        };
        let limiter = Arc::new(CooldownLimiter::new(Duration::ZERO));
        NewsApiFetcher::new(cfg, local_client(), limiter)
    }

    #[tokio::test]
    async fn test_error_status_is_typed_and_degrades_to_empty() {
        let fetcher = keyed_fetcher(serve_status("500 Internal Server Error", "boom").await);

        match fetcher.try_fetch("Bitcoin", 24, 15).await {
            Err(FetchError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {:?}", other),
        }
        assert!(fetcher.fetch("Bitcoin", 24, 15).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_typed_and_degrades_to_empty() {
        let fetcher = keyed_fetcher(refused_url().await);

        assert!(matches!(
            fetcher.try_fetch("Bitcoin", 24, 15).await,
            Err(FetchError::Http(_))
        ));
        assert!(fetcher.fetch("Bitcoin", 24, 15).await.is_empty());
    }
}
