use crate::models::{NewsItem, NEWS_SOURCE};
use anyhow::{Context, Result};
use scraper::{Html, Selector};
use std::time::Duration;

const NBC_PLAYER_NEWS: &str = "https://www.nbcsports.com/fantasy/football/player-news";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Lightweight scraper for the NBC Sports (Rotoworld) player news list
pub struct NewsScraper {
    client: reqwest::Client,
}

impl NewsScraper {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
                .timeout(FETCH_TIMEOUT)
                .build()
                .context("Failed to build news HTTP client")?,
        })
    }

    pub async fn fetch_latest_news(&self, limit: usize) -> Result<Vec<NewsItem>> {
        let response = self
            .client
            .get(NBC_PLAYER_NEWS)
            .send()
            .await
            .context("Failed to fetch player news")?;

        if !response.status().is_success() {
            anyhow::bail!("Player news page returned {}", response.status());
        }

        let html = response.text().await?;
        self.parse_news_html(&html, limit)
    }

    /// Headlines are the fantasy football links on the page. The first
    /// `limit` links are considered and the ones without text are dropped.
    pub fn parse_news_html(&self, html: &str, limit: usize) -> Result<Vec<NewsItem>> {
        let document = Html::parse_document(html);
        let link_selector = Selector::parse(r#"a[href*="/fantasy/football/"]"#)
            .ok()
            .context("Invalid selector")?;

        Ok(document
            .select(&link_selector)
            .take(limit)
            .filter_map(|a| {
                let headline = a
                    .text()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                let url = a.value().attr("href")?.trim().to_string();
                if headline.is_empty() || url.is_empty() {
                    return None;
                }
                Some(NewsItem {
                    headline,
                    url,
                    source: NEWS_SOURCE.to_string(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <a href="/fantasy/football/news/josh-allen-limited">Josh Allen limited (ankle)</a>
          <a href="/nba/news/other">Not football</a>
          <a href="/fantasy/football/news/empty"> </a>
          <a href="/fantasy/football/news/puka">Puka Nacua out for Week 3</a>
          <a href="/fantasy/football/news/late">Too late</a>
        </body></html>
    "#;

    #[test]
    fn test_parse_news_html() {
        let scraper = NewsScraper::new().unwrap();
        let items = scraper.parse_news_html(PAGE, 3).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].headline, "Josh Allen limited (ankle)");
        assert_eq!(items[0].url, "/fantasy/football/news/josh-allen-limited");
        assert_eq!(items[0].source, NEWS_SOURCE);
        assert_eq!(items[1].headline, "Puka Nacua out for Week 3");
    }

    #[tokio::test]
    #[ignore] // requires network access
    async fn test_fetch_latest_news() {
        let scraper = NewsScraper::new().unwrap();
        let items = scraper.fetch_latest_news(25).await.unwrap();
        println!("Fetched {} news items", items.len());
    }
}
