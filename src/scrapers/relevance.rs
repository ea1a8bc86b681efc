//! Keyword scoring and the age window.

use chrono::{Duration, NaiveDate};

/// Date formats tried when reading a normalized date back.
const AGE_FORMATS: &[&str] = &["%d/%m/%y", "%d/%m/%Y"];

/// Keyword list and lookback window applied to every candidate.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
    lookback: Duration,
}

impl RelevanceFilter {
    /// Keywords are matched case-insensitively; blank ones and repeats are
    /// ignored.
    pub fn new(keywords: &[String], lookback: Duration) -> Self {
        let mut lowered: Vec<String> = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        lowered.sort();
        lowered.dedup();
        Self {
            keywords: lowered,
            lookback,
        }
    }

    /// Number of distinct keywords found in `title`.
    pub fn score(&self, title: &str) -> usize {
        let title = title.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| title.contains(k.as_str()))
            .count()
    }

    /// `false` only when `date` parses and falls before `today - lookback`.
    /// A date exactly on the cutoff is still inside the window. A lookback
    /// reaching past the earliest representable date has no cutoff.
    pub fn within_window(&self, date: &str, today: NaiveDate) -> bool {
        let Some(parsed) = AGE_FORMATS
            .iter()
            .find_map(|f| NaiveDate::parse_from_str(date, f).ok())
        else {
            return true;
        };
        match today.checked_sub_signed(self.lookback) {
            Some(cutoff) => parsed >= cutoff,
            None => true,
        }
    }

    /// Score a candidate and apply the age window.
    ///
    /// # Returns
    ///
    /// `Some(score)` when the record should be kept, `None` when it should be
    /// dropped.
    pub fn evaluate(&self, title: &str, date: &str, today: NaiveDate) -> Option<usize> {
        let score = self.score(title);
        if score == 0 || !self.within_window(date, today) {
            return None;
        }
        Some(score)
    }
}
