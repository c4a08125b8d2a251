//! Normalized payout (払い戻し) records and the per-date payout table.
//!
//! The table is persisted as CSV with columns
//! `race_id, bet_type, horse_number, refund, popularity`.

use anyhow::{anyhow, Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::bet_type::BetType;
use crate::marks::normalize_horse_number;

/// Separator between values of a multi-valued cell (one per `<br>`).
pub const REFUND_SEPARATOR: char = '|';

const COLUMNS: [&str; 5] = ["race_id", "bet_type", "horse_number", "refund", "popularity"];

/// One settled payout row of one race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRecord {
    pub race_id: String,
    /// Raw bet type label ("単勝", "ワイド", ...)
    pub bet_type: String,
    /// Horse numbers separated by whitespace, `-`, `→` or [`REFUND_SEPARATOR`]
    pub horse_number: String,
    /// Refund amounts separated by [`REFUND_SEPARATOR`]
    pub refund: String,
    pub popularity: String,
}

impl PayoutRecord {
    /// Build a record from positional cells: bet type, horses, refund, popularity.
    pub fn from_cells(race_id: &str, cells: &[String]) -> Option<Self> {
        if cells.len() < 3 {
            return None;
        }

        Some(Self {
            race_id: race_id.to_string(),
            bet_type: cells[0].trim().to_string(),
            horse_number: cells[1].trim().to_string(),
            refund: cells[2].trim().to_string(),
            popularity: cells.get(3).map(|c| c.trim().to_string()).unwrap_or_default(),
        })
    }

    pub fn bet_type(&self) -> Option<BetType> {
        BetType::from_label(&self.bet_type)
    }

    /// Horse numbers in table order
    pub fn horses(&self) -> Vec<String> {
        self.horse_number
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .map(normalize_horse_number)
            .collect()
    }

    /// Refund values in table order
    pub fn refunds(&self) -> Vec<String> {
        self.refund
            .split(REFUND_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// All payout records of a batch, in extraction order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayoutTable {
    records: Vec<PayoutRecord>,
}

impl PayoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<PayoutRecord>) -> Self {
        Self { records }
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = PayoutRecord>) {
        self.records.extend(records);
    }

    #[allow(dead_code)]
    pub fn records(&self) -> &[PayoutRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct race IDs in order of first appearance
    pub fn race_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for record in &self.records {
            if !ids.contains(&record.race_id.as_str()) {
                ids.push(&record.race_id);
            }
        }
        ids
    }

    /// Records of one race, in table order
    pub fn for_race<'a>(&'a self, race_id: &'a str) -> impl Iterator<Item = &'a PayoutRecord> + 'a {
        self.records.iter().filter(move |r| r.race_id == race_id)
    }

    fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let column = |field: fn(&PayoutRecord) -> &str| -> Vec<String> {
            self.records.iter().map(|r| field(r).to_string()).collect()
        };

        df!(
            COLUMNS[0] => column(|r| r.race_id.as_str()),
            COLUMNS[1] => column(|r| r.bet_type.as_str()),
            COLUMNS[2] => column(|r| r.horse_number.as_str()),
            COLUMNS[3] => column(|r| r.refund.as_str()),
            COLUMNS[4] => column(|r| r.popularity.as_str())
        )
    }

    /// Serialize to CSV (header-only when empty).
    pub fn to_csv(&self) -> Result<String> {
        let mut df = self.to_dataframe()?;
        let mut buf = Vec::new();
        CsvWriter::new(&mut buf)
            .include_header(true)
            .finish(&mut df)
            .context("Failed to write payout CSV")?;
        Ok(String::from_utf8(buf)?)
    }

    /// Load a payout CSV.
    ///
    /// Columns are looked up by name, falling back to position
    /// (bet type, horses, refund, popularity, ..., race id last).
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)
            .with_context(|| format!("Failed to stat {}", path.display()))?
            .len();
        if size == 0 {
            return Ok(Self::new());
        }

        // Schema inference off: every column stays a string ("01" must not become 1)
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
            .with_context(|| format!("Failed to read payout CSV {}", path.display()))?;

        if df.height() == 0 {
            return Ok(Self::new());
        }

        let last = df.width().saturating_sub(1);
        let race_ids = string_column(&df, COLUMNS[0], last)?;
        let bet_types = string_column(&df, COLUMNS[1], 0)?;
        let horses = string_column(&df, COLUMNS[2], 1)?;
        let refunds = string_column(&df, COLUMNS[3], 2)?;
        let popularity = string_column(&df, COLUMNS[4], 3)?;

        let records = (0..df.height())
            .map(|i| PayoutRecord {
                race_id: race_ids.get(i).unwrap_or("").to_string(),
                bet_type: bet_types.get(i).unwrap_or("").to_string(),
                horse_number: horses.get(i).unwrap_or("").to_string(),
                refund: refunds.get(i).unwrap_or("").to_string(),
                popularity: popularity.get(i).unwrap_or("").to_string(),
            })
            .collect();

        Ok(Self { records })
    }
}

fn string_column<'a>(df: &'a DataFrame, name: &str, position: usize) -> Result<&'a StringChunked> {
    let column = match df.column(name) {
        Ok(column) => column,
        Err(_) => df
            .get_columns()
            .get(position)
            .ok_or_else(|| anyhow!("payout CSV has no column {} (position {})", name, position))?,
    };
    Ok(column.str()?)
}
