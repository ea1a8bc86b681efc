//! Everything a run writes once scraping is done.
//!
//! # Submodules
//!
//! - [`csv`]: Timestamped CSV export of the full batch
//! - [`json`]: The snapshot used as the next run's dedup baseline
//! - [`notification`]: Notification decision, payload and delivery
//!
//! # Output Structure
//!
//! ```text
//! output_directory/
//! ├── previous_tenders.json
//! ├── tenders_20250601_120000.csv
//! ├── tenders_20250602_120000.csv
//! └── outbox/
//!     └── notification_20250602_120003.html
//! ```

pub mod csv;
pub mod json;
pub mod notification;
