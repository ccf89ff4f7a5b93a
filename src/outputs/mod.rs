//! Output adapters for crawled records and run reports.
//!
//! # Submodules
//!
//! - [`jsonl`]: the [`jsonl::Sink`] contract and an append-only JSON Lines sink
//! - [`json`]: writes the [`crate::models::CrawlReport`] for a finished run
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── al-hurra.jsonl        # one ArticleRecord per line, appended across runs
//! └── al-hurra_report.json  # report of the latest run
//! ```

pub mod json;
pub mod jsonl;
