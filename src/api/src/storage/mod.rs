//! Artifact storage for daily runs
//!
//! Persists the payout CSV and per-predictor hit reports, and locates
//! the prediction workbooks for a date.

pub mod local;

use anyhow::Result;
use chrono::NaiveDate;
use std::path::PathBuf;

use crate::marks::PredictionBook;
use crate::payout::PayoutTable;

pub use local::LocalStore;

/// Where a run reads its inputs from and writes its artifacts to.
pub trait ArtifactStore: Send + Sync {
    /// Write the payout table for a date (header-only when empty).
    fn save_payouts(&self, date: NaiveDate, table: &PayoutTable) -> Result<PathBuf>;

    /// Write one predictor's hit report for a date.
    fn save_report(&self, date: NaiveDate, label: &str, report: &str) -> Result<PathBuf>;

    /// Location of a predictor's workbook for a date.
    fn workbook_path(&self, date: NaiveDate, file_prefix: &str) -> PathBuf;

    /// Load a predictor's workbook; `Ok(None)` when it does not exist.
    fn load_predictions(&self, date: NaiveDate, file_prefix: &str) -> Result<Option<PredictionBook>>;
}

/// `YYYYMMDD` as used in artifact paths
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
