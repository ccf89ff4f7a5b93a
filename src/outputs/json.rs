//! JSON run report.
//!
//! The report for the latest run replaces any previous one:
//!
//! ```text
//! output_dir/
//! └── al-hurra_report.json
//! ```

use crate::models::CrawlReport;
use crate::utils::slugify;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Path of the report file for `source` inside `output_dir`.
pub fn report_path(output_dir: &str, source: &str) -> PathBuf {
    PathBuf::from(output_dir).join(format!("{}_report.json", slugify(source)))
}

/// Serialize `report` as pretty JSON into `output_dir`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_report(report: &CrawlReport, output_dir: &str) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(%output_dir, error = %e, "Failed to create report dir");
        return Err(e.into());
    }

    let path = report_path(output_dir, &report.source);
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote crawl report");

    Ok(path)
}
