//! Site list loading and group expansion.
//!
//! The site list is a JSON array. Each entry is either a single site or a
//! group sharing a common set of selectors:
//!
//! ```json
//! [
//!   { "name": "DAV CSP", "url": "https://davcsp.org/NoticeBoardDetail.aspx",
//!     "selector": ".notice-list-box", "title_selector": ".head-text",
//!     "date_selector": ".date-text", "link_selector": "a",
//!     "base_url": "https://davcsp.org/" },
//!   { "shared_config": { "selector": "tr", "title_selector": "td.title",
//!                        "date_selector": "td.date", "link_selector": "a" },
//!     "websites": [
//!       { "name": "North Board", "url": "https://north.example/tenders" },
//!       { "name": "South Board", "url": "https://south.example/tenders",
//!         "date_selector": "td.closing" }
//!     ] }
//! ]
//! ```
//!
//! Inside a group the site's own keys win over the shared ones. Anything that
//! does not decode yields an empty list and a warning; the pipeline never sees
//! a configuration error.

use crate::error::Result;
use crate::models::SiteSpec;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument, warn};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SiteEntry {
    Group {
        shared_config: Map<String, Value>,
        websites: Vec<Map<String, Value>>,
    },
    Site(Map<String, Value>),
}

/// Overlay `site` on top of `shared`; keys present in `site` win.
fn merge(shared: &Map<String, Value>, site: Map<String, Value>) -> Map<String, Value> {
    let mut merged = shared.clone();
    merged.extend(site);
    merged
}

fn try_resolve(json: &str) -> Result<Vec<SiteSpec>> {
    let entries: Vec<SiteEntry> = serde_json::from_str(json)?;
    let mut sites = Vec::new();
    for entry in entries {
        match entry {
            SiteEntry::Site(map) => {
                sites.push(serde_json::from_value(Value::Object(map))?);
            }
            SiteEntry::Group {
                shared_config,
                websites,
            } => {
                for site in websites {
                    let merged = merge(&shared_config, site);
                    sites.push(serde_json::from_value(Value::Object(merged))?);
                }
            }
        }
    }
    Ok(sites)
}

/// Expand a JSON site list into a flat, ordered list of [`SiteSpec`].
///
/// Site names must be unique within a run. When a name repeats, the first
/// definition is kept and the later ones are dropped with a warning.
///
/// # Returns
///
/// The resolved sites, or an empty list if the document is malformed.
pub fn resolve_sites(json: &str) -> Vec<SiteSpec> {
    let sites = match try_resolve(json) {
        Ok(sites) => sites,
        Err(e) => {
            warn!(error = %e, "Site list is malformed; continuing with no sites");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    sites
        .into_iter()
        .filter(|site| {
            let first = seen.insert(site.name.clone());
            if !first {
                warn!(site = %site.name, "Duplicate site name; ignoring later definition");
            }
            first
        })
        .collect()
}

/// Read and resolve the site list at `path`.
///
/// A missing or unreadable file is logged and treated as an empty list.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn load_sites(path: impl AsRef<Path>) -> Vec<SiteSpec> {
    let path = path.as_ref();
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            let sites = resolve_sites(&text);
            info!(count = sites.len(), "Loaded site list");
            sites
        }
        Err(e) => {
            warn!(error = %e, "Could not read site list; continuing with no sites");
            Vec::new()
        }
    }
}
