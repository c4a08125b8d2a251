//! Local filesystem artifact store

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{date_key, ArtifactStore};
use crate::marks::PredictionBook;
use crate::payout::PayoutTable;
use crate::workbook::load_prediction_book;

/// Stores artifacts under `<result_dir>/<YYYYMMDD>/` and reads workbooks
/// from `<prediction_dir>/<YYYYMMDD>/`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    result_dir: PathBuf,
    prediction_dir: PathBuf,
}

impl LocalStore {
    pub fn new(result_dir: impl Into<PathBuf>, prediction_dir: impl Into<PathBuf>) -> Self {
        Self {
            result_dir: result_dir.into(),
            prediction_dir: prediction_dir.into(),
        }
    }

    fn result_dir_for(&self, date: NaiveDate) -> Result<PathBuf> {
        let dir = self.result_dir.join(date_key(date));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(dir)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = content.len(), "artifact written");
    Ok(())
}

impl ArtifactStore for LocalStore {
    fn save_payouts(&self, date: NaiveDate, table: &PayoutTable) -> Result<PathBuf> {
        let path = self
            .result_dir_for(date)?
            .join(format!("pay_results_{}.csv", date_key(date)));
        write_file(&path, &table.to_csv()?)?;
        Ok(path)
    }

    fn save_report(&self, date: NaiveDate, label: &str, report: &str) -> Result<PathBuf> {
        let path = self.result_dir_for(date)?.join(format!("{}_的中結果.txt", label));
        write_file(&path, report)?;
        Ok(path)
    }

    fn workbook_path(&self, date: NaiveDate, file_prefix: &str) -> PathBuf {
        let key = date_key(date);
        self.prediction_dir
            .join(&key)
            .join(format!("{}_予測結果_{}.xlsx", file_prefix, key))
    }

    fn load_predictions(&self, date: NaiveDate, file_prefix: &str) -> Result<Option<PredictionBook>> {
        let path = self.workbook_path(date, file_prefix);
        if !path.exists() {
            return Ok(None);
        }
        load_prediction_book(&path).map(Some)
    }
}
