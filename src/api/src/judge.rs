//! Hit judging (的中判定).
//!
//! Cross-references a date's payout table with one predictor's mark sheets
//! and reports, per race, which payouts the marked horses would have won.
//!
//! Rules:
//! - 単勝 / 複勝: the horse carries ◎.
//! - ワイド, 馬連, 3連複, 馬単, 3連単: every horse of the combination carries a
//!   recognized mark and at least one of them carries ◎, ○ or ▲.
//! - 枠連 / 枠単 are not judged.

use anyhow::{bail, Result};
use tracing::{debug, warn};

use crate::bet_type::BetType;
use crate::marks::{Mark, MarkSheet, PredictionBook};
use crate::payout::{PayoutRecord, PayoutTable};
use crate::race::RaceId;

/// Judges payout records against prediction marks
pub struct MarkMatcher;

impl MarkMatcher {
    /// Build the hit report for one predictor.
    ///
    /// One block per race with at least one hit, headed by `<venue><n>R`,
    /// blocks separated by a blank line. Races appear in payout-table order.
    pub fn judge(table: &PayoutTable, book: &PredictionBook) -> String {
        let mut blocks = Vec::new();

        for race_id in table.race_ids() {
            let race = match RaceId::parse(race_id) {
                Ok(race) => race,
                Err(e) => {
                    warn!(race_id, "skipping race: {}", e);
                    continue;
                }
            };

            let Some(sheet) = book.find(race.venue(), &race.race_label()) else {
                warn!(race_id, race = %race.heading(), "prediction sheet missing");
                continue;
            };
            let Some(marks) = &sheet.marks else {
                warn!(race_id, sheet = %sheet.name, "prediction sheet unreadable");
                continue;
            };

            let lines: Vec<String> = table
                .for_race(race_id)
                .flat_map(|record| Self::judge_record(record, marks))
                .collect();

            if lines.is_empty() {
                debug!(race_id, sheet = %sheet.name, "no hits");
                continue;
            }

            let mut block = vec![race.heading()];
            block.extend(lines);
            blocks.push(block.join("\n"));
        }

        blocks.join("\n\n")
    }

    /// Hit lines for a single payout record. Malformed records yield none.
    pub fn judge_record(record: &PayoutRecord, marks: &MarkSheet) -> Vec<String> {
        let Some(bet_type) = record.bet_type() else {
            warn!(race_id = %record.race_id, bet_type = %record.bet_type, "unknown bet type");
            return Vec::new();
        };

        match Self::evaluate(bet_type, &record.horses(), &record.refunds(), marks) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(race_id = %record.race_id, %bet_type, "malformed payout record: {}", e);
                Vec::new()
            }
        }
    }

    fn evaluate(
        bet_type: BetType,
        horses: &[String],
        refunds: &[String],
        marks: &MarkSheet,
    ) -> Result<Vec<String>> {
        match bet_type {
            BetType::BracketQuinella | BetType::BracketExacta => Ok(Vec::new()),
            BetType::Win => {
                Self::expect_arity(bet_type, horses)?;
                Ok(Self::top_mark_hit(bet_type, &horses[0], first(refunds), marks)
                    .into_iter()
                    .collect())
            }
            BetType::Place => {
                if horses.len() != refunds.len() {
                    bail!("{} horses but {} refunds", horses.len(), refunds.len());
                }
                Ok(horses
                    .iter()
                    .zip(refunds)
                    .filter_map(|(horse, refund)| Self::top_mark_hit(bet_type, horse, refund, marks))
                    .collect())
            }
            BetType::Wide => {
                if horses.len() != refunds.len() * 2 {
                    bail!("{} horses for {} refunds", horses.len(), refunds.len());
                }
                Ok(horses
                    .chunks(2)
                    .zip(refunds)
                    .filter_map(|(pair, refund)| Self::marked_combination_hit(bet_type, pair, refund, marks))
                    .collect())
            }
            BetType::Quinella | BetType::Trio | BetType::Exacta | BetType::Trifecta => {
                Self::expect_arity(bet_type, horses)?;
                Ok(Self::marked_combination_hit(bet_type, horses, first(refunds), marks)
                    .into_iter()
                    .collect())
            }
        }
    }

    fn expect_arity(bet_type: BetType, horses: &[String]) -> Result<()> {
        if horses.len() != bet_type.arity() {
            bail!("expected {} horses, got {:?}", bet_type.arity(), horses);
        }
        Ok(())
    }

    /// `単勝：3 ◎：150円` when the horse carries ◎
    fn top_mark_hit(bet_type: BetType, horse: &str, refund: &str, marks: &MarkSheet) -> Option<String> {
        (marks.mark(horse) == Some(Mark::Top))
            .then(|| format!("{}：{} {}：{}", bet_type.label(), horse, Mark::Top, refund))
    }

    /// `ワイド：4-7 ○◎：320円` when all horses are marked and one mark is important
    fn marked_combination_hit(
        bet_type: BetType,
        horses: &[String],
        refund: &str,
        marks: &MarkSheet,
    ) -> Option<String> {
        let found: Vec<Mark> = horses
            .iter()
            .map(|h| marks.mark(h))
            .collect::<Option<Vec<_>>>()?;

        if !found.iter().any(Mark::is_important) {
            return None;
        }

        let symbols: String = found.iter().map(Mark::symbol).collect();
        Some(format!(
            "{}：{} {}：{}",
            bet_type.label(),
            horses.join(bet_type.joiner()),
            symbols,
            refund
        ))
    }
}

/// First refund value, or empty when the cell was blank
fn first(refunds: &[String]) -> &str {
    refunds.first().map(String::as_str).unwrap_or("")
}
