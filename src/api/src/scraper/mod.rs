//! Payout scraper for netkeiba.com race result pages
//!
//! Fetches one result page per race ID, paced by a rate limiter, and
//! collects the extracted payout rows into a single table.

pub mod parsers;
pub mod rate_limiter;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info};

use crate::payout::{PayoutRecord, PayoutTable};

pub use parsers::RefundParser;
pub use rate_limiter::RateLimiter;

/// Base URL for local (NAR) racing on netkeiba.com
pub const BASE_URL: &str = "https://nar.netkeiba.com";

/// Result pages are served as EUC-JP
const PAGE_CHARSET: &str = "EUC-JP";

/// Build race result URL
pub fn race_result_url(base_url: &str, race_id: &str) -> String {
    format!(
        "{}/race/result.html?race_id={}&rf=race_list",
        base_url.trim_end_matches('/'),
        race_id
    )
}

/// Source of decoded page markup
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher with a browser-like User-Agent
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text_with_charset(PAGE_CHARSET).await?)
    }
}

/// Fetches result pages and extracts payout tables
pub struct PayoutScraper<F> {
    fetcher: F,
    limiter: RateLimiter,
    base_url: String,
}

impl<F: PageFetcher> PayoutScraper<F> {
    pub fn new(fetcher: F, limiter: RateLimiter, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            limiter,
            base_url: base_url.into(),
        }
    }

    /// Scrape every race in order. A race that fails or has no payout
    /// table contributes nothing; the others are unaffected.
    pub async fn scrape(&self, race_ids: &[String]) -> PayoutTable {
        let mut table = PayoutTable::new();

        for race_id in race_ids {
            self.limiter.acquire().await;

            match self.scrape_race(race_id).await {
                Ok(records) if records.is_empty() => info!(race_id = %race_id, "no payouts"),
                Ok(records) => {
                    info!(race_id = %race_id, records = records.len(), "payouts extracted");
                    table.extend(records);
                }
                Err(e) => error!(race_id = %race_id, "scrape failed: {:#}", e),
            }
        }

        info!(
            races = race_ids.len(),
            records = table.len(),
            "scrape finished"
        );
        table
    }

    async fn scrape_race(&self, race_id: &str) -> Result<Vec<PayoutRecord>> {
        let url = race_result_url(&self.base_url, race_id);
        let html = self
            .fetcher
            .fetch(&url)
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;
        Ok(RefundParser::extract(&html, race_id))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use anyhow::bail;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned pages keyed by race ID; unknown races fail.
    #[derive(Default)]
    pub struct FakeFetcher {
        pages: HashMap<String, String>,
        pub requested: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn with_page(mut self, race_id: &str, html: &str) -> Self {
            self.pages.insert(race_id.to_string(), html.to_string());
            self
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            let race_id = url
                .split("race_id=")
                .nth(1)
                .and_then(|rest| rest.split('&').next())
                .unwrap_or("");
            match self.pages.get(race_id) {
                Some(html) => Ok(html.clone()),
                None => bail!("404 for {}", url),
            }
        }
    }

    pub const PAYOUT_PAGE: &str = r#"<html><body>
<table summary="払い戻し">
  <tr><th>単勝</th><td>3</td><td>150円</td><td>1人気</td></tr>
  <tr><th>ワイド</th><td>3 7<br />3 12<br />7 12</td><td>320円<br />750円<br />1,980円</td><td>3人気</td></tr>
</table>
</body></html>"#;
}

#[cfg(test)]
mod tests {
    use super::testing::{FakeFetcher, PAYOUT_PAGE};
    use super::*;

    #[test]
    fn test_race_result_url() {
        assert_eq!(
            race_result_url(BASE_URL, "202544101511"),
            "https://nar.netkeiba.com/race/result.html?race_id=202544101511&rf=race_list"
        );
        assert_eq!(
            race_result_url("http://localhost:8000/", "202544101511"),
            "http://localhost:8000/race/result.html?race_id=202544101511&rf=race_list"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scrape_skips_failed_and_empty_races() {
        let fetcher = FakeFetcher::default()
            .with_page("202544101501", PAYOUT_PAGE)
            .with_page("202544101502", "<html><body>発走前</body></html>")
            .with_page("202544101504", PAYOUT_PAGE);
        let scraper = PayoutScraper::new(fetcher, RateLimiter::from_secs(1.0), BASE_URL);

        let race_ids: Vec<String> = ["202544101501", "202544101502", "202544101503", "202544101504"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let table = scraper.scrape(&race_ids).await;

        assert_eq!(table.len(), 4);
        assert_eq!(table.race_ids(), vec!["202544101501", "202544101504"]);
        assert_eq!(scraper.fetcher.requested.lock().unwrap().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_equals_per_race_extraction() {
        let fetcher = FakeFetcher::default()
            .with_page("202544101501", PAYOUT_PAGE)
            .with_page("202544101502", PAYOUT_PAGE);
        let scraper = PayoutScraper::new(fetcher, RateLimiter::from_secs(0.0), BASE_URL);

        let race_ids = vec!["202544101501".to_string(), "202544101502".to_string()];
        let table = scraper.scrape(&race_ids).await;

        for race_id in &race_ids {
            let grouped: Vec<PayoutRecord> = table.for_race(race_id).cloned().collect();
            assert_eq!(grouped, RefundParser::extract(PAYOUT_PAGE, race_id));
        }
    }
}
