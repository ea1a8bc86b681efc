//! Snapshot file: the full batch of the last run, keyed by site name.
//!
//! The snapshot is read at the start of a run as the dedup baseline and
//! overwritten wholesale at the end, even when every site came back empty.
//!
//! ```text
//! output_directory/
//! ├── previous_tenders.json
//! ├── tenders_20250601_120000.csv
//! └── outbox/
//! ```

use crate::error::Result;
use crate::models::{Batch, count_records};
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Read the previous snapshot.
///
/// A missing file means this is the first run. A file that cannot be read or
/// decoded is logged and treated as empty, so every record of this run will
/// count as new.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_snapshot(path: &Path) -> Batch {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No previous snapshot; every record is new");
            return Batch::new();
        }
        Err(e) => {
            error!(error = %e, "Could not read snapshot; treating as empty");
            return Batch::new();
        }
    };

    match serde_json::from_str::<Batch>(&text) {
        Ok(snapshot) => {
            info!(sites = snapshot.len(), records = count_records(&snapshot), "Loaded snapshot");
            snapshot
        }
        Err(e) => {
            error!(error = %e, "Snapshot is malformed; treating as empty");
            Batch::new()
        }
    }
}

/// Overwrite the snapshot with `batch`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_snapshot(batch: &Batch, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(batch)?;
    fs::write(path, json).await?;
    info!(sites = batch.len(), records = count_records(batch), "Wrote snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record;

    #[tokio::test]
    async fn test_snapshot_round_trip_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("previous_tenders.json");

        let mut first = Batch::new();
        first.insert("a".into(), vec![record("a", "Tender 1", "01/06/25")]);
        first.insert("b".into(), vec![record("b", "Tender 2", "TBD")]);
        write_snapshot(&first, &path).await.unwrap();

        let mut second = Batch::new();
        second.insert("a".into(), vec![]);
        write_snapshot(&second, &path).await.unwrap();

        let loaded = load_snapshot(&path).await;
        assert_eq!(loaded, second);
        assert!(!loaded.contains_key("b"));
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_snapshot(&dir.path().join("none.json")).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_snapshot_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("previous_tenders.json");
        fs::write(&path, "{\"a\": 42}").await.unwrap();
        assert!(load_snapshot(&path).await.is_empty());
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("previous_tenders.json");
        assert!(write_snapshot(&Batch::new(), &path).await.is_err());
    }
}
