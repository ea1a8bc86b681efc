//! Heuristic date normalization.
//!
//! Notice boards print dates in every shape imaginable, usually surrounded by
//! labels like "Published on:" or "Last date -". [`normalize_date`] looks for
//! the first date-shaped substring that is a real date and rewrites it as
//! `dd/mm/yy`.
//! Text that holds no recognizable date is returned as-is.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical output format for normalized dates.
pub const CANONICAL_FORMAT: &str = "%d/%m/%y";

/// Tried in order against a candidate substring. Two-digit year forms come
/// first because `%y` refuses trailing digits, while `%Y` would happily read
/// `24` as the year 24 AD.
const PARSE_TEMPLATES: &[&str] = &[
    "%d/%m/%y", "%d/%m/%Y", "%d-%m-%y", "%d-%m-%Y", "%Y-%m-%d", "%Y/%m/%d", "%d %b %y",
    "%d %b %Y",
];

static YEAR_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{4}[/-]\d{1,2}[/-]\d{1,2}\b").expect("year-first pattern compiles")
});

static DAY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,2}[/-]\d{1,2}[/-](?:\d{4}|\d{2})\b").expect("day-first pattern compiles")
});

static TEXTUAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?[\s-]+(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?,?[\s-]+(\d{4}|\d{2})\b",
    )
    .expect("textual pattern compiles")
});

/// Rewrite a textual match as `"{day} {Mon} {year}"`.
fn textual_candidate(caps: &regex::Captures<'_>) -> String {
    // "September", "Sept" and "sep" all become "Sep"
    let abbrev: String = caps[2]
        .chars()
        .take(3)
        .enumerate()
        .map(|(i, c)| {
            if i == 0 {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect();
    format!("{} {} {}", &caps[1], abbrev, &caps[3])
}

/// Every date-shaped substring, year-first matches before day-first before
/// textual, each rewritten into a form the parse templates understand.
fn candidates(text: &str) -> impl Iterator<Item = String> + '_ {
    YEAR_FIRST
        .find_iter(text)
        .chain(DAY_FIRST.find_iter(text))
        .map(|m| m.as_str().to_string())
        .chain(TEXTUAL.captures_iter(text).map(|caps| textual_candidate(&caps)))
}

fn parse_candidate(candidate: &str) -> Option<NaiveDate> {
    PARSE_TEMPLATES
        .iter()
        .find_map(|template| NaiveDate::parse_from_str(candidate, template).ok())
}

/// Normalize free-form date text to `dd/mm/yy`.
///
/// Never fails: when no pattern matches, or the matched text is not a real
/// calendar date (`31/02/2024`), the trimmed input comes back unchanged.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_date("26 May 2025"), "26/05/25");
/// assert_eq!(normalize_date("Published: 2025-05-26"), "26/05/25");
/// assert_eq!(normalize_date("TBD"), "TBD");
/// ```
pub fn normalize_date(text: &str) -> String {
    let trimmed = text.trim();
    candidates(trimmed)
        .find_map(|candidate| parse_candidate(&candidate))
        .map(|date| date.format(CANONICAL_FORMAT).to_string())
        .unwrap_or_else(|| trimmed.to_string())
}
