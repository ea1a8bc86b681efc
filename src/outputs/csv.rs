//! Timestamped CSV export of a run's full batch.
//!
//! One file per run, `tenders_<YYYYmmdd_HHMMSS>.csv`, one row per record
//! across all sites. Nothing is written for an empty batch.

use crate::error::Result;
use crate::models::{Batch, TenderRecord};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

pub const HEADER: [&str; 9] = [
    "id",
    "site",
    "source_url",
    "tags",
    "title",
    "date",
    "link",
    "score",
    "scraped_at",
];

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write one comma-separated row, quoting fields that need it.
pub fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

fn record_row(record: &TenderRecord) -> [String; 9] {
    [
        record.id.clone(),
        record.site.clone(),
        record.source_url.clone(),
        record.tags.clone(),
        record.title.clone(),
        record.date.clone(),
        record.link.clone(),
        record.score.to_string(),
        record.scraped_at.clone(),
    ]
}

/// Render the flattened batch, header first.
pub fn render_batch(batch: &Batch) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    write_row(&mut out, &HEADER)?;
    for record in batch.values().flatten() {
        write_row(&mut out, &record_row(record))?;
    }
    Ok(out)
}

/// Write the batch to `<output_dir>/tenders_<timestamp>.csv`.
///
/// # Returns
///
/// The path written, or `None` when the batch held no records.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_export(
    batch: &Batch,
    output_dir: &Path,
    timestamp: &str,
) -> Result<Option<PathBuf>> {
    if batch.values().all(Vec::is_empty) {
        info!("No records; skipping CSV export");
        return Ok(None);
    }

    let path = output_dir.join(format!("tenders_{timestamp}.csv"));
    let bytes = render_batch(batch)?;
    fs::write(&path, bytes).await?;
    info!(path = %path.display(), "Wrote CSV export");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record;

    #[test]
    fn test_write_row_quotes_when_needed() {
        let mut out = Vec::new();
        write_row(&mut out, &["plain", "a, b", "say \"hi\"", "two\nlines"]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "plain,\"a, b\",\"say \"\"hi\"\"\",\"two\nlines\"\n"
        );
    }

    #[test]
    fn test_render_batch_flattens_all_sites() {
        let mut batch = Batch::new();
        batch.insert("a".into(), vec![record("a", "Tender 1", "01/06/25")]);
        batch.insert("b".into(), vec![record("b", "Tender 2", "TBD")]);
        batch.insert("c".into(), vec![]);

        let text = String::from_utf8(render_batch(&batch).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id,site,source_url,tags,title,date,link,score,scraped_at");
        assert!(lines[1].starts_with("a_Tender 1_01/06/25,a,https://a.example/,a,Tender 1,01/06/25,,1,"));
        assert!(lines[2].starts_with("b_Tender 2_TBD,b,"));
    }

    #[tokio::test]
    async fn test_write_export_skips_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut batch = Batch::new();
        batch.insert("a".into(), vec![]);
        let written = write_export(&batch, dir.path(), "20250601_120000").await.unwrap();
        assert!(written.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_write_export_names_file_by_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let mut batch = Batch::new();
        batch.insert("a".into(), vec![record("a", "Tender 1", "01/06/25")]);
        let written = write_export(&batch, dir.path(), "20250601_120000")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(written, dir.path().join("tenders_20250601_120000.csv"));
        let text = std::fs::read_to_string(written).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
