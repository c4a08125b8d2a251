//! Prediction marks (印) and per-race mark sheets.

use std::collections::HashMap;
use std::fmt;

/// A predictor's confidence mark for one horse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    Top,    // ◎
    Second, // ○
    Third,  // ▲
    Fourth, // △
    Fifth,  // ☆
    Note,   // 注
}

impl Mark {
    /// Parse a mark symbol. Anything outside the alphabet is not a mark.
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s.trim() {
            "◎" => Some(Mark::Top),
            "○" | "〇" => Some(Mark::Second),
            "▲" => Some(Mark::Third),
            "△" => Some(Mark::Fourth),
            "☆" => Some(Mark::Fifth),
            "注" => Some(Mark::Note),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Mark::Top => "◎",
            Mark::Second => "○",
            Mark::Third => "▲",
            Mark::Fourth => "△",
            Mark::Fifth => "☆",
            Mark::Note => "注",
        }
    }

    /// ◎ ○ ▲
    pub fn is_important(&self) -> bool {
        matches!(self, Mark::Top | Mark::Second | Mark::Third)
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Normalize a horse number so "03", "3" and "3.0" compare equal.
pub fn normalize_horse_number(s: &str) -> String {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<u32>() {
        return n.to_string();
    }
    // Spreadsheet cells often come back as floats
    if let Ok(f) = trimmed.parse::<f64>() {
        if f >= 0.0 && f.fract() == 0.0 && f < u32::MAX as f64 {
            return (f as u32).to_string();
        }
    }
    trimmed.to_string()
}

/// Horse number -> mark for one race of one predictor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkSheet {
    marks: HashMap<String, Mark>,
}

impl MarkSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (horse number, mark symbol) pairs. Unrecognized symbols
    /// and blank marks leave the horse unmarked; later rows win.
    pub fn from_pairs<I, H, M>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (H, M)>,
        H: AsRef<str>,
        M: AsRef<str>,
    {
        let mut sheet = Self::new();
        for (horse, symbol) in pairs {
            let horse = normalize_horse_number(horse.as_ref());
            match Mark::from_symbol(symbol.as_ref()) {
                Some(mark) => sheet.insert(&horse, mark),
                None => {
                    sheet.marks.remove(&horse);
                }
            }
        }
        sheet
    }

    pub fn insert(&mut self, horse: &str, mark: Mark) {
        self.marks.insert(normalize_horse_number(horse), mark);
    }

    /// Mark for a horse; `None` means unmarked.
    pub fn mark(&self, horse: &str) -> Option<Mark> {
        self.marks.get(&normalize_horse_number(horse)).copied()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

/// One named sheet of a prediction workbook.
#[derive(Debug, Clone)]
pub struct PredictionSheet {
    pub name: String,
    /// `None` when the sheet could not be read as a mark table
    pub marks: Option<MarkSheet>,
}

/// All sheets of one predictor's workbook, in workbook order.
#[derive(Debug, Clone, Default)]
pub struct PredictionBook {
    sheets: Vec<PredictionSheet>,
}

impl PredictionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, marks: MarkSheet) {
        self.sheets.push(PredictionSheet {
            name: name.into(),
            marks: Some(marks),
        });
    }

    pub fn push_unusable(&mut self, name: impl Into<String>) {
        self.sheets.push(PredictionSheet {
            name: name.into(),
            marks: None,
        });
    }

    /// First sheet whose name contains both the venue and the race label.
    pub fn find(&self, venue: &str, race_label: &str) -> Option<&PredictionSheet> {
        self.sheets
            .iter()
            .find(|s| s.name.contains(venue) && s.name.contains(race_label))
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_symbols() {
        assert_eq!(Mark::from_symbol("◎"), Some(Mark::Top));
        assert_eq!(Mark::from_symbol("〇"), Some(Mark::Second));
        assert_eq!(Mark::from_symbol(" 注 "), Some(Mark::Note));
        assert_eq!(Mark::from_symbol("×"), None);
        assert_eq!(Mark::from_symbol(""), None);
        assert_eq!(Mark::Third.symbol(), "▲");
    }

    #[test]
    fn test_important_marks() {
        assert!(Mark::Top.is_important());
        assert!(Mark::Second.is_important());
        assert!(Mark::Third.is_important());
        assert!(!Mark::Fourth.is_important());
        assert!(!Mark::Fifth.is_important());
        assert!(!Mark::Note.is_important());
    }

    #[test]
    fn test_normalize_horse_number() {
        assert_eq!(normalize_horse_number("3"), "3");
        assert_eq!(normalize_horse_number("03"), "3");
        assert_eq!(normalize_horse_number(" 12 "), "12");
        assert_eq!(normalize_horse_number("7.0"), "7");
        assert_eq!(normalize_horse_number("abc"), "abc");
    }

    #[test]
    fn test_mark_sheet_from_pairs() {
        let sheet = MarkSheet::from_pairs([("1", "◎"), ("2", ""), ("3.0", "▲"), ("4", "消")]);

        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.mark("1"), Some(Mark::Top));
        assert_eq!(sheet.mark("2"), None);
        assert_eq!(sheet.mark("03"), Some(Mark::Third));
        assert_eq!(sheet.mark("4"), None);
        assert_eq!(sheet.mark("9"), None);
    }

    #[test]
    fn test_mark_sheet_later_rows_win() {
        let sheet = MarkSheet::from_pairs([("5", "◎"), ("5", "△"), ("6", "○"), ("6", "")]);
        assert_eq!(sheet.mark("5"), Some(Mark::Fourth));
        assert_eq!(sheet.mark("6"), None);
    }

    #[test]
    fn test_find_sheet_first_match_wins() {
        let mut book = PredictionBook::new();
        book.push("大井11R", MarkSheet::new());
        book.push("大井1R", MarkSheet::new());
        book.push("川崎1R", MarkSheet::new());

        // "1R" is a substring of "11R"
        assert_eq!(book.find("大井", "1R").unwrap().name, "大井11R");
        assert_eq!(book.find("川崎", "1R").unwrap().name, "川崎1R");
        assert!(book.find("船橋", "1R").is_none());
    }

    #[test]
    fn test_find_unusable_sheet() {
        let mut book = PredictionBook::new();
        book.push_unusable("浦和5R メモ");

        let sheet = book.find("浦和", "5R").unwrap();
        assert!(sheet.marks.is_none());
        assert_eq!(book.len(), 1);
    }
}
