//! Prediction workbook loading via calamine.
//!
//! Each sheet holds one race: a header row followed by one row per horse,
//! with the horse number under `馬番` and the mark under `印`.

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, warn};

use crate::marks::{MarkSheet, PredictionBook};

const HORSE_COLUMN: &str = "馬番";
const MARK_COLUMN: &str = "印";

/// Load every sheet of a workbook, in workbook order.
pub fn load_prediction_book<P: AsRef<Path>>(path: P) -> Result<PredictionBook> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;

    let mut book = PredictionBook::new();
    for name in workbook.sheet_names() {
        let range = match workbook.worksheet_range(&name) {
            Ok(range) => range,
            Err(e) => {
                warn!(sheet = %name, "unreadable sheet: {}", e);
                book.push_unusable(name);
                continue;
            }
        };

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        match mark_sheet_from_rows(&rows) {
            Some(sheet) => {
                debug!(sheet = %name, marked = sheet.len(), "sheet loaded");
                book.push(name, sheet);
            }
            None => {
                warn!(sheet = %name, "sheet has no {}/{} columns", HORSE_COLUMN, MARK_COLUMN);
                book.push_unusable(name);
            }
        }
    }

    Ok(book)
}

/// Build a mark sheet from a header row plus data rows.
/// Returns `None` when the header lacks either required column.
pub fn mark_sheet_from_rows(rows: &[Vec<String>]) -> Option<MarkSheet> {
    let (header, data) = rows.split_first()?;
    let horse_idx = header.iter().position(|h| h.trim() == HORSE_COLUMN)?;
    let mark_idx = header.iter().position(|h| h.trim() == MARK_COLUMN)?;

    let pairs = data.iter().filter_map(|row| {
        let horse = row.get(horse_idx)?.trim();
        if horse.is_empty() {
            return None;
        }
        let mark = row.get(mark_idx).map(String::as_str).unwrap_or("");
        Some((horse, mark))
    });

    Some(MarkSheet::from_pairs(pairs))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::Mark;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_mark_sheet_from_rows() {
        let sheet = mark_sheet_from_rows(&rows(&[
            &["印", "馬番", "馬名"],
            &["◎", "3", "ホース3"],
            &["", "5", "ホース5"],
            &["▲", "07", "ホース7"],
        ]))
        .unwrap();

        assert_eq!(sheet.mark("3"), Some(Mark::Top));
        assert_eq!(sheet.mark("5"), None);
        assert_eq!(sheet.mark("7"), Some(Mark::Third));
    }

    #[test]
    fn test_short_rows_are_unmarked() {
        let sheet = mark_sheet_from_rows(&rows(&[&["馬番", "印"], &["1"], &["", "◎"], &["2", "○"]])).unwrap();

        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.mark("1"), None);
        assert_eq!(sheet.mark("2"), Some(Mark::Second));
    }

    #[test]
    fn test_missing_columns() {
        assert!(mark_sheet_from_rows(&rows(&[&["馬番", "馬名"], &["1", "ホース1"]])).is_none());
        assert!(mark_sheet_from_rows(&[]).is_none());
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(3.0)), "3");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Int(12)), "12");
        assert_eq!(cell_text(&Data::String("◎".to_string())), "◎");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    fn fixture() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/predictions.xlsx")
    }

    #[test]
    fn test_load_prediction_book() {
        let book = load_prediction_book(fixture()).unwrap();
        assert_eq!(book.len(), 3);

        let sheet = book.find("大井", "11R").unwrap();
        let marks = sheet.marks.as_ref().unwrap();
        assert_eq!(marks.mark("3"), Some(Mark::Top));
        assert_eq!(marks.mark("5"), None);
        assert_eq!(marks.mark("7"), Some(Mark::Third));
        assert_eq!(marks.mark("12"), Some(Mark::Note));
    }

    #[test]
    fn test_load_keeps_workbook_order() {
        let book = load_prediction_book(fixture()).unwrap();

        // "大井11R" precedes "大井1R", so it wins the "1R" lookup
        assert_eq!(book.find("大井", "1R").unwrap().name, "大井11R");
    }

    #[test]
    fn test_load_marks_sheet_without_columns_unusable() {
        let book = load_prediction_book(fixture()).unwrap();

        let sheet = book.find("川崎", "2R").unwrap();
        assert_eq!(sheet.name, "川崎2R メモ");
        assert!(sheet.marks.is_none());
    }

    #[test]
    fn test_missing_workbook_is_error() {
        assert!(load_prediction_book("/nonexistent/予測結果.xlsx").is_err());
    }
}
