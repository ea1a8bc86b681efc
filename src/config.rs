//! Runtime settings loaded from a YAML file.
//!
//! Every key is optional; a missing file or a file that does not decode
//! falls back to [`Settings::default`] so a fresh checkout can run straight
//! away (with no keywords configured, nothing will be kept).
//!
//! ```yaml
//! output_directory: output
//! sites_file: config/websites_config.json
//! check_interval_hours: 24
//! keywords: [tender, quotation, bid]
//! lookback_days: 90
//! max_concurrent_sites: 8
//! request_timeout_secs: 120
//! notifications:
//!   enabled: true
//!   sender: alerts@example.org
//!   recipient: procurement@example.org
//! ```

use crate::error::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;
use tracing::{info, instrument, warn};

const DEFAULT_INTERVAL_HOURS: i64 = 24;

/// Larger windows are clamped; ten thousand years already keeps everything.
pub const MAX_LOOKBACK_DAYS: i64 = 3_650_000;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Where CSV exports, the snapshot and the notification outbox live.
    pub output_directory: PathBuf,
    /// JSON site list, see [`crate::sites`].
    pub sites_file: PathBuf,
    pub check_interval_hours: i64,
    /// Case-insensitive substrings a title must contain to be kept.
    pub keywords: Vec<String>,
    /// Records dated earlier than this many days ago are dropped.
    pub lookback_days: i64,
    pub max_concurrent_sites: usize,
    pub request_timeout_secs: u64,
    pub notifications: NotificationSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub sender: String,
    pub recipient: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("output"),
            sites_file: PathBuf::from("config/websites_config.json"),
            check_interval_hours: DEFAULT_INTERVAL_HOURS,
            keywords: Vec::new(),
            lookback_days: 90,
            max_concurrent_sites: 8,
            request_timeout_secs: 120,
            notifications: NotificationSettings::default(),
        }
    }
}

impl Settings {
    /// Decode settings from YAML text, clamping nonsensical values.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(text)?;
        Ok(settings.sanitized())
    }

    fn sanitized(mut self) -> Self {
        if self.check_interval_hours <= 0 {
            warn!(
                check_interval_hours = self.check_interval_hours,
                "Invalid check interval; defaulting to {DEFAULT_INTERVAL_HOURS} hours"
            );
            self.check_interval_hours = DEFAULT_INTERVAL_HOURS;
        }
        if self.max_concurrent_sites == 0 {
            warn!("max_concurrent_sites must be at least 1; using 1");
            self.max_concurrent_sites = 1;
        }
        if self.lookback_days < 0 {
            warn!(lookback_days = self.lookback_days, "Negative lookback window; using 0");
            self.lookback_days = 0;
        }
        if self.lookback_days > MAX_LOOKBACK_DAYS {
            warn!(
                lookback_days = self.lookback_days,
                "Lookback window too large; using {MAX_LOOKBACK_DAYS} days"
            );
            self.lookback_days = MAX_LOOKBACK_DAYS;
        }
        self.keywords.retain(|k| !k.trim().is_empty());
        self
    }

    pub fn lookback(&self) -> Duration {
        Duration::try_days(self.lookback_days).unwrap_or(Duration::MAX)
    }

    pub fn check_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.check_interval_hours as u64 * 3600)
    }

    pub fn request_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.request_timeout_secs)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.output_directory.join("previous_tenders.json")
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.output_directory.join("outbox")
    }
}

/// Load settings from `path`, falling back to defaults.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn load_settings(path: impl AsRef<Path>) -> Settings {
    let path = path.as_ref();
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No settings file; using defaults");
            return Settings::default();
        }
        Err(e) => {
            warn!(error = %e, "Could not read settings; using defaults");
            return Settings::default();
        }
    };

    match Settings::from_yaml(&text) {
        Ok(settings) => {
            info!(
                keywords = settings.keywords.len(),
                lookback_days = settings.lookback_days,
                notifications = settings.notifications.enabled,
                "Loaded settings"
            );
            settings
        }
        Err(e) => {
            warn!(error = %e, "Settings file is malformed; using defaults");
            Settings::default()
        }
    }
}
