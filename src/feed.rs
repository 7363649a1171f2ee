use crate::api::sleeper_api::SleeperClient;
use crate::models::{NewsItem, Player, ScrapedAdp, ScrapedRank};
use crate::scrapers::fantasypros::FantasyProsScraper;
use crate::scrapers::news::NewsScraper;
use crate::utils::data::{cache_is_fresh, load_from_cache, save_to_cache};
use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Number of news links considered per refresh
pub const NEWS_LIMIT: usize = 100;

/// The external datasets a refresh pulls from
#[async_trait]
pub trait DataFeed: Send + Sync {
    async fn fetch_roster(&self) -> Result<Vec<Player>>;
    async fn fetch_consensus(&self) -> Result<Vec<ScrapedRank>>;
    async fn fetch_primary_adp(&self) -> Result<Vec<ScrapedAdp>>;
    async fn fetch_secondary_adp(&self) -> Result<Vec<ScrapedAdp>>;
    async fn fetch_news(&self) -> Result<Vec<NewsItem>>;
}

/// Sleeper roster, FantasyPros ranks and ADP, NBC news
pub struct LiveFeed {
    sleeper: SleeperClient,
    fantasypros: FantasyProsScraper,
    news: NewsScraper,
}

impl LiveFeed {
    pub fn new() -> Result<Self> {
        Ok(Self {
            sleeper: SleeperClient::new()?,
            fantasypros: FantasyProsScraper::new()?,
            news: NewsScraper::new()?,
        })
    }
}

#[async_trait]
impl DataFeed for LiveFeed {
    async fn fetch_roster(&self) -> Result<Vec<Player>> {
        self.sleeper.fetch_roster().await
    }

    async fn fetch_consensus(&self) -> Result<Vec<ScrapedRank>> {
        self.fantasypros.fetch_ecr().await
    }

    async fn fetch_primary_adp(&self) -> Result<Vec<ScrapedAdp>> {
        self.fantasypros.fetch_adp_half().await
    }

    async fn fetch_secondary_adp(&self) -> Result<Vec<ScrapedAdp>> {
        self.fantasypros.fetch_bestball_adp().await
    }

    async fn fetch_news(&self) -> Result<Vec<NewsItem>> {
        self.news.fetch_latest_news(NEWS_LIMIT).await
    }
}

/// Wraps another feed and reuses JSON snapshots under `cache_dir` while they
/// are younger than their TTL. News uses its own, shorter TTL.
pub struct CachedFeed<F> {
    inner: F,
    cache_dir: PathBuf,
    data_ttl: Duration,
    news_ttl: Duration,
}

impl<F: DataFeed> CachedFeed<F> {
    pub fn new(inner: F, cache_dir: impl Into<PathBuf>, data_ttl: Duration, news_ttl: Duration) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
            data_ttl,
            news_ttl,
        }
    }

    async fn cached<T, Fut>(&self, name: &str, ttl: Duration, fetch: Fut) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = Result<T>>,
    {
        let path = self.cache_dir.join(format!("{name}.json"));
        if cache_is_fresh(&path, ttl) {
            match load_from_cache(&path) {
                Ok(data) => {
                    debug!("Using cached {} from {}", name, path.display());
                    return Ok(data);
                }
                Err(e) => warn!("Ignoring unreadable cache {}: {:#}", path.display(), e),
            }
        }

        let data = fetch.await?;
        if let Err(e) = save_to_cache(&data, &path) {
            warn!("Failed to write cache {}: {:#}", path.display(), e);
        }
        Ok(data)
    }
}

#[async_trait]
impl<F: DataFeed> DataFeed for CachedFeed<F> {
    async fn fetch_roster(&self) -> Result<Vec<Player>> {
        self.cached("roster", self.data_ttl, self.inner.fetch_roster())
            .await
    }

    async fn fetch_consensus(&self) -> Result<Vec<ScrapedRank>> {
        self.cached("consensus", self.data_ttl, self.inner.fetch_consensus())
            .await
    }

    async fn fetch_primary_adp(&self) -> Result<Vec<ScrapedAdp>> {
        self.cached("adp_half", self.data_ttl, self.inner.fetch_primary_adp())
            .await
    }

    async fn fetch_secondary_adp(&self) -> Result<Vec<ScrapedAdp>> {
        self.cached("adp_bestball", self.data_ttl, self.inner.fetch_secondary_adp())
            .await
    }

    async fn fetch_news(&self) -> Result<Vec<NewsItem>> {
        self.cached("news", self.news_ttl, self.inner.fetch_news())
            .await
    }
}
