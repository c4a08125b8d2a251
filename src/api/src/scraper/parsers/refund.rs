//! Payout (払い戻し) table parser for netkeiba race result pages.
//!
//! Result pages carry the payout block as two adjacent tables after the
//! finishing-order table. When that layout does not hold, the parser falls
//! back to the table whose `summary` or `<caption>` names it the payout table.

use anyhow::{bail, Result};
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::payout::{PayoutRecord, REFUND_SEPARATOR};

/// Cells of one table row, as text
type Row = Vec<String>;

/// A way of locating payout rows in a parsed page
type Strategy = fn(&Html) -> Result<Vec<Row>>;

/// Strategies tried in order; the first that succeeds wins.
const STRATEGIES: [(&str, Strategy); 2] = [
    ("adjacent tables", RefundParser::parse_adjacent_tables),
    ("captioned table", RefundParser::parse_captioned_table),
];

/// Minimum cells in a payout row: bet type, horses, refund, popularity
const PAYOUT_ROW_WIDTH: usize = 4;

fn caption_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"払い?戻し?").expect("valid regex"))
}

/// Parser for payout tables
pub struct RefundParser;

impl RefundParser {
    /// Extract payout records from a result page.
    ///
    /// Returns an empty list when the page has no table (results not yet
    /// published) or when no strategy finds payout rows.
    pub fn extract(html: &str, race_id: &str) -> Vec<PayoutRecord> {
        if !html.to_ascii_lowercase().contains("<table") {
            debug!(race_id, "no table in page");
            return Vec::new();
        }

        let document = Html::parse_document(html);

        let mut rows = None;
        for (name, strategy) in STRATEGIES {
            match strategy(&document) {
                Ok(found) => {
                    debug!(race_id, strategy = name, rows = found.len(), "payout rows found");
                    rows = Some(found);
                    break;
                }
                Err(e) => debug!(race_id, strategy = name, "payout layout not matched: {}", e),
            }
        }

        let Some(rows) = rows else {
            warn!(race_id, "no payout table");
            return Vec::new();
        };

        rows.iter()
            .filter_map(|cells| {
                let record = PayoutRecord::from_cells(race_id, cells);
                if record.is_none() {
                    warn!(race_id, ?cells, "skipping payout row with too few cells");
                }
                record
            })
            .collect()
    }

    /// Generic table parse: payout rows are the data rows of tables 1 and 2.
    fn parse_adjacent_tables(document: &Html) -> Result<Vec<Row>> {
        let table_selector = Selector::parse("table").expect("valid selector");
        let tables: Vec<ElementRef> = document.select(&table_selector).collect();

        if tables.len() < 3 {
            bail!("expected payout tables at positions 1 and 2, found {} tables", tables.len());
        }

        let mut rows = Vec::new();
        for table in &tables[1..3] {
            let (_, data) = Self::table_rows(*table);
            rows.extend(data);
        }

        if rows.is_empty() {
            bail!("tables 1 and 2 have no data rows");
        }
        if let Some(row) = rows.iter().find(|r| r.len() < PAYOUT_ROW_WIDTH) {
            bail!("row too narrow for a payout row: {:?}", row);
        }

        Ok(rows)
    }

    /// The table identified as the payout table by its summary or caption.
    fn parse_captioned_table(document: &Html) -> Result<Vec<Row>> {
        let table_selector = Selector::parse("table").expect("valid selector");

        // Only the table's own summary and caption count; a layout table
        // wrapping the payout table must not match.
        let table = document.select(&table_selector).find(|table| {
            let summary = table.value().attr("summary").unwrap_or("");
            caption_re().is_match(summary)
                || table
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| c.value().name() == "caption")
                    .any(|c| caption_re().is_match(&c.text().collect::<String>()))
        });

        let Some(table) = table else {
            bail!("no table captioned as payout table");
        };

        let (columns, rows) = Self::table_rows(table);
        if !columns.is_empty() {
            debug!(?columns, "payout table header");
        }
        if rows.is_empty() {
            bail!("payout table has no data rows");
        }

        Ok(rows)
    }

    /// Split a table into header cell names and data rows.
    ///
    /// A row with only `<th>` cells is a header row. Rows of nested tables
    /// are not included.
    fn table_rows(table: ElementRef) -> (Vec<String>, Vec<Row>) {
        let mut columns = Vec::new();
        let mut rows = Vec::new();

        for row in Self::direct_rows(table) {
            let cells: Vec<ElementRef> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|c| matches!(c.value().name(), "th" | "td"))
                .collect();

            if cells.is_empty() {
                continue;
            }

            let has_data = cells.iter().any(|c| c.value().name() == "td");
            let texts: Row = cells.into_iter().map(Self::cell_text).collect();

            if has_data {
                rows.push(texts);
            } else {
                columns.extend(texts);
            }
        }

        (columns, rows)
    }

    /// `<tr>` elements belonging to this table (directly or via thead/tbody/tfoot)
    fn direct_rows(table: ElementRef) -> Vec<ElementRef> {
        let mut rows = Vec::new();
        for child in table.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "tr" => rows.push(child),
                "thead" | "tbody" | "tfoot" => rows.extend(
                    child
                        .children()
                        .filter_map(ElementRef::wrap)
                        .filter(|e| e.value().name() == "tr"),
                ),
                _ => {}
            }
        }
        rows
    }

    /// Cell text, one part per `<br>`-separated line, joined with
    /// [`REFUND_SEPARATOR`]. A literal separator in the text is a plain gap.
    fn cell_text(cell: ElementRef) -> String {
        let mut parts = vec![String::new()];
        for node in cell.descendants() {
            let piece = match node.value() {
                Node::Element(el) if el.name() == "br" => {
                    parts.push(String::new());
                    continue;
                }
                // Block children (one horse per <li>/<div>) need a gap
                Node::Element(el) if matches!(el.name(), "div" | "li" | "p" | "ul") => " ".to_string(),
                Node::Text(text) => text.replace(REFUND_SEPARATOR, " "),
                _ => continue,
            };
            if let Some(current) = parts.last_mut() {
                current.push_str(&piece);
            }
        }

        parts
            .iter()
            .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(&REFUND_SEPARATOR.to_string())
    }
}
