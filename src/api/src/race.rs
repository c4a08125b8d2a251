//! Race identifier decoding.
//!
//! Race ID format: YYYY + venue code (2) + MM + DD + race number (2),
//! e.g. `202544101511` is 大井 11R on 2025-10-15.

use anyhow::{bail, Result};
use chrono::{Datelike, NaiveDate};

/// Venue name used when the code is not in the lookup table
pub const UNKNOWN_VENUE: &str = "不明";

/// Highest race number run at a single meeting
pub const MAX_RACE_NUMBER: u8 = 12;

/// Venue code -> venue name (JRA 01-10, NAR 30-65)
const VENUES: [(&str, &str); 25] = [
    ("01", "札幌"),
    ("02", "函館"),
    ("03", "福島"),
    ("04", "新潟"),
    ("05", "東京"),
    ("06", "中山"),
    ("07", "中京"),
    ("08", "京都"),
    ("09", "阪神"),
    ("10", "小倉"),
    ("30", "門別"),
    ("35", "盛岡"),
    ("36", "水沢"),
    ("42", "浦和"),
    ("43", "船橋"),
    ("44", "大井"),
    ("45", "川崎"),
    ("46", "金沢"),
    ("47", "笠松"),
    ("48", "名古屋"),
    ("50", "園田"),
    ("51", "姫路"),
    ("54", "高知"),
    ("55", "佐賀"),
    ("65", "帯広"),
];

/// Look up a venue name by its two-digit code.
pub fn venue_name(code: &str) -> &'static str {
    VENUES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_VENUE)
}

/// A validated 12-digit race identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RaceId {
    raw: String,
    race_number: u8,
}

impl RaceId {
    /// Parse and validate a race ID string
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.len() != 12 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            bail!("race id must be 12 digits: {:?}", raw);
        }

        let race_number: u8 = raw[10..12].parse()?;
        if race_number == 0 || race_number > MAX_RACE_NUMBER {
            bail!("race number out of range in {}: {}", raw, race_number);
        }

        Ok(Self {
            raw: raw.to_string(),
            race_number,
        })
    }

    /// Build a race ID from its parts
    pub fn build(date: NaiveDate, venue_code: &str, race_number: u8) -> String {
        format!(
            "{:04}{}{:02}{:02}{:02}",
            date.year(),
            venue_code,
            date.month(),
            date.day(),
            race_number
        )
    }

    pub fn venue_code(&self) -> &str {
        &self.raw[4..6]
    }

    pub fn venue(&self) -> &'static str {
        venue_name(self.venue_code())
    }

    #[allow(dead_code)]
    pub fn race_number(&self) -> u8 {
        self.race_number
    }

    /// Race number label as printed in sheet names ("11R")
    pub fn race_label(&self) -> String {
        format!("{}R", self.race_number)
    }

    /// Report heading: venue + race label ("大井11R")
    pub fn heading(&self) -> String {
        format!("{}{}", self.venue(), self.race_label())
    }

    /// Meeting date, if the embedded month/day form a valid date
    #[allow(dead_code)]
    pub fn date(&self) -> Option<NaiveDate> {
        let year = self.raw[0..4].parse().ok()?;
        let month = self.raw[6..8].parse().ok()?;
        let day = self.raw[8..10].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

/// All race IDs for a date: every venue, races 1..=races_per_venue.
pub fn race_ids_for_date(date: NaiveDate, venue_codes: &[String], races_per_venue: u8) -> Vec<String> {
    let races = races_per_venue.min(MAX_RACE_NUMBER);
    venue_codes
        .iter()
        .flat_map(|code| (1..=races).map(move |n| RaceId::build(date, code, n)))
        .collect()
}
