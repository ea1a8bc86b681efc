//! Data models for site specifications and the tender records scraped from them.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SiteSpec`]: How to fetch and parse one notice board
//! - [`TenderRecord`]: A listing that survived relevance filtering
//! - [`Batch`]: Records grouped by site name, also the on-disk snapshot shape
//! - [`RunResult`]: The full batch plus the subset that is new since the last run

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Records grouped by site name.
///
/// A `BTreeMap` keeps the snapshot file stable between runs, which makes it
/// diffable by hand.
pub type Batch = BTreeMap<String, Vec<TenderRecord>>;

/// A single site to watch.
///
/// Selectors are plain CSS selectors understood by the `scraper` crate. The
/// `selector` field picks the repeating container element; every other
/// selector is evaluated relative to one container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SiteSpec {
    /// Unique site name. Part of every record's identity.
    pub name: String,
    /// Page to fetch.
    pub url: String,
    /// Base for resolving relative links. Falls back to `url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Selector for the record container.
    pub selector: String,
    pub title_selector: String,
    pub date_selector: String,
    pub link_selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags_selector: Option<String>,
}

impl SiteSpec {
    /// The URL relative links are resolved against.
    pub fn link_base(&self) -> &str {
        self.base_url
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(self.url.as_str())
    }
}

/// A tender listing kept for this run.
///
/// Records only exist once they have passed relevance filtering, so `score`
/// is always at least 1 for anything produced by the scraper. Snapshot files
/// written before `tags`, `score` and `source_url` existed still decode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TenderRecord {
    /// Dedup key, see [`TenderRecord::identity`].
    pub id: String,
    /// Name of the site this record came from.
    pub site: String,
    #[serde(default)]
    pub source_url: String,
    /// Comma-joined tags; always ends with the site name.
    #[serde(default)]
    pub tags: String,
    pub title: String,
    /// `dd/mm/yy` when the date could be normalized, raw text otherwise.
    pub date: String,
    /// Absolute link, or empty when the listing had none.
    #[serde(default)]
    pub link: String,
    /// Number of keywords matched in the title.
    #[serde(default)]
    pub score: usize,
    /// RFC 3339 capture time.
    pub scraped_at: String,
}

impl TenderRecord {
    /// Composite identity of a record: `"{site}_{title}_{date}"`.
    ///
    /// Two listings on the same site with identical title and date produce
    /// the same id and are treated as one record by deduplication.
    pub fn identity(site: &str, title: &str, date: &str) -> String {
        format!("{site}_{title}_{date}")
    }
}

/// Output of one pipeline run.
#[derive(Debug, Default)]
pub struct RunResult {
    /// Every kept record, by site. Becomes the next snapshot.
    pub batch: Batch,
    /// Records whose id was not in the previous snapshot, by site.
    pub new: Batch,
}

impl RunResult {
    pub fn total(&self) -> usize {
        count_records(&self.batch)
    }

    pub fn new_count(&self) -> usize {
        count_records(&self.new)
    }
}

/// Total number of records across all sites of a batch.
pub fn count_records(batch: &Batch) -> usize {
    batch.values().map(Vec::len).sum()
}

#[cfg(test)]
pub(crate) fn record(site: &str, title: &str, date: &str) -> TenderRecord {
    TenderRecord {
        id: TenderRecord::identity(site, title, date),
        site: site.to_string(),
        source_url: format!("https://{site}.example/"),
        tags: site.to_string(),
        title: title.to_string(),
        date: date.to_string(),
        link: String::new(),
        score: 1,
        scraped_at: "2025-05-26T10:00:00+00:00".to_string(),
    }
}
