use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use market_mood::config::config::AppCfg;
use market_mood::market::aggregator::MarketAggregator;
use market_mood::ratelimit::cooldown::CooldownLimiter;
use market_mood::sentiment::classifier::FinBertClient;
use market_mood::sentiment::ensemble::{EnsembleConfig, EnsembleScorer};
use market_mood::sentiment::lexical::VaderScorer;
use market_mood::sentiment::polarity::PolarityScorer;
use market_mood::sources::newsapi::NewsApiFetcher;
use market_mood::sources::twitter::TwitterFetcher;
use reqwest::Client;
use std::sync::Arc;
use tracing::{Instrument, info, info_span};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "market_mood")]
#[command(about = "Financial sentiment from news and social chatter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file; missing is fine, env vars fill the gaps
    #[arg(short, long, default_value = "config.yml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single piece of text
    Text { text: String },
    /// Fetch recent news and posts and print the market verdict
    Market,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let cfg = AppCfg::load(&cli.config)?;

    // Root span for the supervisor/main thread
    let span = info_span!(
        "Supervisor",
        pid = %std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
    );

    async move {
        info!("Starting up");

        info!("Initializing Client");
        let client = Client::builder()
            .user_agent(cfg.http.user_agent.clone())
            .pool_idle_timeout(cfg.http.pool_idle_timeout)
            .pool_max_idle_per_host(cfg.http.pool_max_idle_per_host)
            .tcp_keepalive(cfg.http.tcp_keep_alive)
            .timeout(cfg.http.timeout)
            .build()
            .context("building http client")?;

        info!("Building scorer");
        let scorer = Arc::new(EnsembleScorer::new(
            Arc::new(FinBertClient::new(cfg.classifier.clone(), client.clone())),
            Arc::new(VaderScorer::new()),
            Arc::new(PolarityScorer::new()),
            EnsembleConfig::from_cfg(&cfg.scorer, &cfg.classifier),
        ));

        match cli.command {
            Commands::Text { text } => {
                let score = scorer
                    .analyze_text(&text)
                    .instrument(info_span!("Text"))
                    .await;
                println!("{}", serde_json::to_string_pretty(&score)?);
            }
            Commands::Market => {
                // one cooldown shared by both outbound services
                let limiter = Arc::new(CooldownLimiter::new(cfg.rate_limit.cooldown));
                info!(cooldown = ?limiter.cooldown(), "Shared rate limiter ready");
                let news = NewsApiFetcher::new(cfg.news.clone(), client.clone(), limiter.clone());
                let social = TwitterFetcher::new(cfg.social.clone(), client.clone(), limiter);

                let aggregator = MarketAggregator::new(
                    Arc::new(news),
                    Arc::new(social),
                    scorer,
                    cfg.market.clone(),
                );
                let sentiment = aggregator
                    .get_market_sentiment()
                    .instrument(info_span!("Market"))
                    .await;
                info!(label = %sentiment.label, "Verdict");
                println!("{}", serde_json::to_string_pretty(&sentiment)?);
            }
        }

        info!("Supervisor exit");
        Ok::<(), anyhow::Error>(())
    }
    .instrument(span)
    .await
}
