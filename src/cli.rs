//! Command-line interface definitions for Tender Watch.
//!
//! Flags override the matching keys of the settings file for this process
//! only; the file itself is never modified.

use crate::config::Settings;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Tender Watch application.
///
/// # Examples
///
/// ```sh
/// # Watch forever using config/config.yaml
/// tender_watch
///
/// # Single run with a different site list and output directory
/// tender_watch --once -s ./boards.json -o ./out
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML settings file
    #[arg(short, long, env = "TENDER_WATCH_CONFIG", default_value = "config/config.yaml")]
    pub config: PathBuf,

    /// Output directory for exports, the snapshot and the outbox
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// JSON site list to use instead of the one named in the settings
    #[arg(short, long)]
    pub sites: Option<PathBuf>,

    /// Run once and exit instead of looping
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    pub fn apply_overrides(&self, mut settings: Settings) -> Settings {
        if let Some(dir) = &self.output_dir {
            settings.output_directory = dir.clone();
        }
        if let Some(sites) = &self.sites {
            settings.sites_file = sites.clone();
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["tender_watch"]);
        assert!(!cli.once);
        assert!(cli.output_dir.is_none());
        assert!(cli.sites.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "tender_watch",
            "-c",
            "/etc/tw.yaml",
            "-o",
            "/tmp/out",
            "-s",
            "/tmp/sites.json",
            "--once",
        ]);

        assert_eq!(cli.config, PathBuf::from("/etc/tw.yaml"));
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(cli.sites, Some(PathBuf::from("/tmp/sites.json")));
        assert!(cli.once);
    }

    #[test]
    fn test_overrides_replace_only_given_values() {
        let cli = Cli::parse_from(["tender_watch", "--output-dir", "/tmp/out"]);
        let settings = cli.apply_overrides(Settings::default());
        assert_eq!(settings.output_directory, PathBuf::from("/tmp/out"));
        assert_eq!(settings.sites_file, Settings::default().sites_file);
    }
}
