//! One complete run: fetch, dedup, persist, notify.

use crate::config::Settings;
use crate::dedup::new_since_snapshot;
use crate::error::Result;
use crate::models::{RunResult, count_records};
use crate::outputs::csv::write_export;
use crate::outputs::json::{load_snapshot, write_snapshot};
use crate::outputs::notification::{Notifier, build_notification};
use crate::scrapers::engine::FetchEngine;
use crate::sites::load_sites;
use crate::utils::{ensure_writable_dir, run_timestamp};
use chrono::Local;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Everything one run needs.
#[derive(Debug)]
pub struct Pipeline<N> {
    settings: Settings,
    engine: FetchEngine,
    notifier: N,
}

impl<N: Notifier> Pipeline<N> {
    pub fn new(settings: Settings, engine: FetchEngine, notifier: N) -> Self {
        Self {
            settings,
            engine,
            notifier,
        }
    }

    /// Run the whole pipeline once.
    ///
    /// Per-site failures, persistence failures and delivery failures are
    /// logged and do not fail the run. Persistence always happens before the
    /// notification is attempted.
    ///
    /// # Errors
    ///
    /// Fails only when the output directory cannot be created or written.
    #[instrument(level = "info", skip_all)]
    pub async fn run_once(&self) -> Result<RunResult> {
        let started = Instant::now();
        let now = Local::now();
        let output_dir = &self.settings.output_directory;
        let snapshot_path = self.settings.snapshot_path();

        ensure_writable_dir(output_dir).await?;

        let sites = load_sites(&self.settings.sites_file).await;
        let snapshot = load_snapshot(&snapshot_path).await;

        let batch = self.engine.fetch_all(&sites, now.date_naive()).await;
        let new = new_since_snapshot(&batch, &snapshot);

        if let Err(e) = write_export(&batch, output_dir, &run_timestamp(now)).await {
            error!(error = %e, "Failed to write CSV export");
        }
        if let Err(e) = write_snapshot(&batch, &snapshot_path).await {
            error!(error = %e, "Failed to write snapshot; next run will compare against the older one");
        }

        if let Some(notification) = build_notification(&new, &self.settings.notifications, now) {
            if let Err(e) = self.notifier.deliver(&notification).await {
                error!(error = %e, "Notification delivery failed");
            }
        }

        let elapsed = started.elapsed();
        info!(
            sites = batch.len(),
            records = count_records(&batch),
            new = count_records(&new),
            ?elapsed,
            "Run complete"
        );
        Ok(RunResult { batch, new })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationSettings;
    use crate::outputs::notification::OutboxNotifier;
    use std::path::Path;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"
        <table>
          <tr class="notice"><td class="t">Tender for school buses</td><td class="d">TBD</td>
              <td><a href="/t/1">view</a></td></tr>
          <tr class="notice"><td class="t">Quotation for printers</td><td class="d">TBD</td></tr>
          <tr class="notice"><td class="t">Results announced</td><td class="d">TBD</td></tr>
        </table>"#;

    async fn mount_sites(server: &MockServer, names: &[&str]) {
        for name in names {
            Mock::given(method("GET"))
                .and(path(format!("/{name}")))
                .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
                .mount(server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(server)
            .await;
    }

    fn write_site_list(dir: &Path, server: &MockServer, names: &[&str]) -> std::path::PathBuf {
        let websites: Vec<serde_json::Value> = names
            .iter()
            .map(|name| serde_json::json!({ "name": name, "url": format!("{}/{name}", server.uri()) }))
            .collect();
        let list = serde_json::json!([{
            "shared_config": {
                "selector": "tr.notice",
                "title_selector": ".t",
                "date_selector": ".d",
                "link_selector": "a"
            },
            "websites": websites
        }]);
        let path = dir.join("websites.json");
        std::fs::write(&path, list.to_string()).unwrap();
        path
    }

    fn settings(dir: &Path, sites_file: std::path::PathBuf) -> Settings {
        Settings {
            output_directory: dir.join("out"),
            sites_file,
            keywords: vec!["tender".to_string(), "quotation".to_string()],
            notifications: NotificationSettings {
                enabled: true,
                sender: "alerts@example.org".to_string(),
                recipient: "ops@example.org".to_string(),
            },
            ..Settings::default()
        }
    }

    fn pipeline(settings: Settings) -> Pipeline<OutboxNotifier> {
        let engine = FetchEngine::new(&settings).unwrap();
        let notifier = OutboxNotifier::new(settings.outbox_dir());
        Pipeline::new(settings, engine, notifier)
    }

    fn outbox_len(settings: &Settings) -> usize {
        std::fs::read_dir(settings.outbox_dir()).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_second_run_over_unchanged_sources_has_nothing_new() {
        let server = MockServer::start().await;
        let names = ["alpha", "beta"];
        mount_sites(&server, &names).await;
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), write_site_list(dir.path(), &server, &names));
        let pipeline = pipeline(settings.clone());

        let first = pipeline.run_once().await.unwrap();
        assert_eq!(first.total(), 4);
        assert_eq!(first.new_count(), 4);
        assert!(settings.snapshot_path().exists());
        assert_eq!(outbox_len(&settings), 1);

        let second = pipeline.run_once().await.unwrap();
        assert_eq!(second.total(), 4);
        assert_eq!(second.new_count(), 0);
        assert!(second.new.values().all(Vec::is_empty));
        // nothing new, so no second notification
        assert_eq!(outbox_len(&settings), 1);
    }

    #[tokio::test]
    async fn test_failing_site_still_persists_the_rest() {
        let server = MockServer::start().await;
        let names = ["s1", "s2", "down", "s3", "s4"];
        mount_sites(&server, &names[..2]).await;
        mount_sites(&server, &names[3..]).await;
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), write_site_list(dir.path(), &server, &names));

        let result = pipeline(settings.clone()).run_once().await.unwrap();

        assert_eq!(result.batch.len(), 5);
        assert!(result.batch["down"].is_empty());
        for name in ["s1", "s2", "s3", "s4"] {
            assert_eq!(result.batch[name].len(), 2, "{name}");
        }

        let snapshot = load_snapshot(&settings.snapshot_path()).await;
        assert_eq!(snapshot, result.batch);
        let csv_files = std::fs::read_dir(&settings.output_directory)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("tenders_"))
            .count();
        assert_eq!(csv_files, 1);
    }

    #[tokio::test]
    async fn test_empty_site_list_still_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), dir.path().join("missing.json"));

        let result = pipeline(settings.clone()).run_once().await.unwrap();

        assert!(result.batch.is_empty());
        assert_eq!(std::fs::read_to_string(settings.snapshot_path()).unwrap(), "{}");
        assert_eq!(outbox_len(&settings), 0);
    }

    #[tokio::test]
    async fn test_unwritable_output_directory_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let mut settings = settings(dir.path(), dir.path().join("missing.json"));
        settings.output_directory = blocker.join("out");

        assert!(pipeline(settings).run_once().await.is_err());
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_fail_the_run() {
        let server = MockServer::start().await;
        mount_sites(&server, &["alpha"]).await;
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path(), write_site_list(dir.path(), &server, &["alpha"]));
        settings.notifications.recipient = String::new();

        let result = pipeline(settings.clone()).run_once().await.unwrap();
        assert_eq!(result.new_count(), 2);
        assert!(settings.snapshot_path().exists());
        assert_eq!(outbox_len(&settings), 0);
    }
}
