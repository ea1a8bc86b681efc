//! Selector-driven extraction of candidate records from a fetched page.
//!
//! Each site names a container selector and a set of field selectors that are
//! evaluated inside every container. Missing fields fall back to sentinels
//! rather than failing the container:
//!
//! | Field | Fallback |
//! |-------|----------|
//! | title | `"Unknown Title"` |
//! | date  | `"Unknown Date"` |
//! | link  | `""` |
//! | tags  | site name only |

use crate::error::{Result, TenderError};
use crate::models::{SiteSpec, TenderRecord};
use crate::scrapers::dates::normalize_date;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_DATE: &str = "Unknown Date";

/// Lowercase letter immediately followed by an uppercase one.
static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z])([A-Z])").expect("camel boundary pattern compiles"));

/// A listing pulled out of one container, before relevance filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    /// Normalized date, or the raw text when normalization did not apply.
    pub date: String,
    pub link: String,
    pub tags: String,
}

impl Candidate {
    /// Attach identity, score and capture time.
    pub fn into_record(self, site: &SiteSpec, score: usize, scraped_at: &str) -> TenderRecord {
        TenderRecord {
            id: TenderRecord::identity(&site.name, &self.title, &self.date),
            site: site.name.clone(),
            source_url: site.url.clone(),
            tags: self.tags,
            title: self.title,
            date: self.date,
            link: self.link,
            score,
            scraped_at: scraped_at.to_string(),
        }
    }
}

struct SiteSelectors {
    container: Selector,
    title: Selector,
    date: Selector,
    link: Selector,
    tags: Option<Selector>,
}

impl SiteSelectors {
    fn compile(site: &SiteSpec) -> Result<Self> {
        Ok(Self {
            container: compile(&site.selector)?,
            title: compile(&site.title_selector)?,
            date: compile(&site.date_selector)?,
            link: compile(&site.link_selector)?,
            tags: site
                .tags_selector
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(compile)
                .transpose()?,
        })
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| TenderError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Text content with runs of whitespace collapsed to single spaces.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().split_whitespace().join(" ")
}

/// Insert `", "` wherever a lowercase letter runs straight into an uppercase
/// one, so `"CivilWorksElectrical"` becomes `"Civil, Works, Electrical"`.
pub fn split_camel_case(label: &str) -> String {
    CAMEL_BOUNDARY.replace_all(label, "${1}, ${2}").into_owned()
}

/// Resolve `href` against `base` unless it is already absolute.
pub fn resolve_link(href: &str, base: &str) -> Result<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Ok(href.to_string());
    }
    let link_error = |source| TenderError::Link {
        href: href.to_string(),
        base: base.to_string(),
        source,
    };
    let base_url = Url::parse(base).map_err(link_error)?;
    let resolved = base_url.join(href).map_err(link_error)?;
    Ok(resolved.to_string())
}

fn extract_title(container: ElementRef<'_>, selector: &Selector) -> String {
    let Some(element) = container.select(selector).next() else {
        return UNKNOWN_TITLE.to_string();
    };
    let text = element_text(element);
    let attribute = element.value().attr("title").map(str::trim).unwrap_or("");

    match (text.is_empty(), attribute.is_empty()) {
        (true, true) => UNKNOWN_TITLE.to_string(),
        (true, false) => attribute.to_string(),
        (false, false) if attribute != text => format!("{text}: {attribute}"),
        _ => text,
    }
}

fn extract_tags(container: ElementRef<'_>, selector: Option<&Selector>, site_name: &str) -> String {
    let mut tags: Vec<String> = selector
        .map(|selector| {
            container
                .select(selector)
                .map(element_text)
                .filter(|t| !t.is_empty())
                .map(|t| split_camel_case(&t))
                .collect()
        })
        .unwrap_or_default();
    tags.push(site_name.to_string());
    tags.join(", ")
}

fn extract_date(container: ElementRef<'_>, selector: &Selector) -> String {
    container
        .select(selector)
        .next()
        .map(|element| normalize_date(&element_text(element)))
        .filter(|date| !date.is_empty())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

fn extract_link(container: ElementRef<'_>, selector: &Selector, site: &SiteSpec) -> Result<String> {
    let href = container
        .select(selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .map(str::trim)
        .unwrap_or("");
    if href.is_empty() {
        return Ok(String::new());
    }
    resolve_link(href, site.link_base())
}

fn extract_container(
    container: ElementRef<'_>,
    selectors: &SiteSelectors,
    site: &SiteSpec,
) -> Result<Candidate> {
    Ok(Candidate {
        title: extract_title(container, &selectors.title),
        date: extract_date(container, &selectors.date),
        link: extract_link(container, &selectors.link, site)?,
        tags: extract_tags(container, selectors.tags.as_ref(), &site.name),
    })
}

/// Extract every candidate record from `html` using the site's selectors.
///
/// A page without any matching container yields an empty list. A container
/// whose fields cannot be extracted is logged and skipped without affecting
/// its siblings.
///
/// # Errors
///
/// Returns [`TenderError::Selector`] if any of the site's selectors is not
/// valid CSS.
#[instrument(level = "debug", skip_all, fields(site = %site.name))]
pub fn extract_candidates(html: &str, site: &SiteSpec) -> Result<Vec<Candidate>> {
    let selectors = SiteSelectors::compile(site)?;
    let document = Html::parse_document(html);

    let containers: Vec<ElementRef<'_>> = document.select(&selectors.container).collect();
    if containers.is_empty() {
        warn!(selector = %site.selector, "No record containers matched");
        return Ok(Vec::new());
    }

    let mut candidates = Vec::with_capacity(containers.len());
    for (index, container) in containers.into_iter().enumerate() {
        match extract_container(container, &selectors, site) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => warn!(index, error = %e, "Skipping container"),
        }
    }
    debug!(count = candidates.len(), "Extracted candidates");
    Ok(candidates)
}
