//! Change detection against the previous run's snapshot.

use crate::models::{Batch, TenderRecord};
use std::collections::HashSet;

/// Records in `batch` that were not present in `snapshot`, by site.
///
/// Comparison is by record id within a site. A site missing from the
/// snapshot is seen for the first time and all of its records are new.
/// Sites that are only in the snapshot are dropped.
pub fn new_since_snapshot(batch: &Batch, snapshot: &Batch) -> Batch {
    batch
        .iter()
        .map(|(site, records)| {
            let new: Vec<TenderRecord> = match snapshot.get(site) {
                Some(previous) => {
                    let seen: HashSet<&str> = previous.iter().map(|r| r.id.as_str()).collect();
                    records
                        .iter()
                        .filter(|r| !seen.contains(r.id.as_str()))
                        .cloned()
                        .collect()
                }
                None => records.clone(),
            };
            (site.clone(), new)
        })
        .collect()
}
