//! Concurrent fetching of every configured site.
//!
//! One future per site runs on a bounded `buffer_unordered` stream. A future
//! only ever waits on its own request; parsing and filtering happen
//! synchronously once the body has arrived. Failures stay inside the site
//! that produced them and show up as an empty record list.

use crate::config::Settings;
use crate::error::Result;
use crate::models::{Batch, SiteSpec, TenderRecord};
use crate::scrapers::extract::extract_candidates;
use crate::scrapers::relevance::RelevanceFilter;
use chrono::{Local, NaiveDate};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{error, info, instrument};

/// Fetches, extracts and filters a list of sites.
#[derive(Debug, Clone)]
pub struct FetchEngine {
    client: Client,
    filter: RelevanceFilter,
    max_concurrent: usize,
}

impl FetchEngine {
    /// Build an engine with a client using the configured request timeout.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let filter = RelevanceFilter::new(&settings.keywords, settings.lookback());
        Ok(Self::with_client(client, filter, settings.max_concurrent_sites))
    }

    pub fn with_client(client: Client, filter: RelevanceFilter, max_concurrent: usize) -> Self {
        Self {
            client,
            filter,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Scrape every site and collect the kept records by site name.
    ///
    /// Waits for all sites before returning. Every site in `sites` is present
    /// in the result, with an empty list if it failed or kept nothing.
    ///
    /// # Arguments
    ///
    /// * `sites` - Sites to scrape; names are assumed unique
    /// * `today` - Reference date for the age window
    #[instrument(level = "info", skip_all, fields(sites = sites.len(), max_concurrent = self.max_concurrent))]
    pub async fn fetch_all(&self, sites: &[SiteSpec], today: NaiveDate) -> Batch {
        let results: Vec<(String, Vec<TenderRecord>)> = stream::iter(sites)
            .map(|site| async move { (site.name.clone(), self.scrape_site(site, today).await) })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut batch = Batch::new();
        for (name, records) in results {
            batch.insert(name, records);
        }
        batch
    }

    #[instrument(level = "info", skip_all, fields(site = %site.name, url = %site.url))]
    async fn scrape_site(&self, site: &SiteSpec, today: NaiveDate) -> Vec<TenderRecord> {
        match self.fetch_page(&site.url).await {
            Ok(html) => self.process_page(&html, site, today),
            Err(e) => {
                error!(error = %e, "Fetch failed; site yields no records");
                Vec::new()
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Extract candidates from a fetched page and keep the relevant ones.
    pub fn process_page(&self, html: &str, site: &SiteSpec, today: NaiveDate) -> Vec<TenderRecord> {
        let candidates = match extract_candidates(html, site) {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(site = %site.name, error = %e, "Extraction failed; site yields no records");
                return Vec::new();
            }
        };

        let found = candidates.len();
        let scraped_at = Local::now().to_rfc3339();
        let records: Vec<TenderRecord> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let score = self.filter.evaluate(&candidate.title, &candidate.date, today)?;
                Some(candidate.into_record(site, score, &scraped_at))
            })
            .collect();

        info!(site = %site.name, found, kept = records.len(), "Scraped site");
        records
    }
}
