//! Daily run: scrape every race of a date, store the payout table, then
//! judge each prediction source against it and store the reports.

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{AppConfig, PredictorConfig};
use crate::judge::MarkMatcher;
use crate::payout::PayoutTable;
use crate::race::race_ids_for_date;
use crate::scraper::{PageFetcher, PayoutScraper};
use crate::storage::{date_key, ArtifactStore};
use crate::types::{RunResponse, RunStatus, SourceOutcome, SourceStatus};

const JST_OFFSET_HOURS: i64 = 9;

/// Today's date in Japan Standard Time
pub fn today_jst() -> NaiveDate {
    (Utc::now() + Duration::hours(JST_OFFSET_HOURS)).date_naive()
}

/// Parse `YYYYMMDD` or `YYYY-MM-DD`; `None` or blank means today (JST).
pub fn parse_run_date(raw: Option<&str>) -> Result<NaiveDate> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(today_jst()),
        Some(s) => s,
    };

    for format in ["%Y%m%d", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    bail!("Invalid date {:?}: expected YYYYMMDD or YYYY-MM-DD", raw)
}

/// Run the full pipeline for one date.
pub async fn run_daily<F, S>(
    scraper: &PayoutScraper<F>,
    store: Arc<S>,
    config: &AppConfig,
    date: NaiveDate,
) -> Result<RunResponse>
where
    F: PageFetcher,
    S: ArtifactStore + 'static,
{
    let race_ids = race_ids_for_date(date, &config.scrape.venue_codes, config.scrape.races_per_venue);
    info!(date = %date, races = race_ids.len(), "daily run started");

    let table = scraper.scrape(&race_ids).await;

    // Workbook reads and artifact writes are blocking file I/O
    let predictors = config.predictors.clone();
    tokio::task::spawn_blocking(move || store_and_judge(store.as_ref(), &predictors, date, &table))
        .await
        .context("Storage task failed")?
}

/// Store the payout table, then judge every source against it.
fn store_and_judge<S: ArtifactStore>(
    store: &S,
    predictors: &[PredictorConfig],
    date: NaiveDate,
    table: &PayoutTable,
) -> Result<RunResponse> {
    let csv = store.save_payouts(date, table)?;

    if table.is_empty() {
        warn!(date = %date, "no payouts for any race");
        return Ok(RunResponse {
            status: RunStatus::NoData,
            date: date_key(date),
            csv: csv.display().to_string(),
            records: 0,
            txt: Vec::new(),
        });
    }

    let txt = judge_sources(store, predictors, date, table);
    info!(date = %date, records = table.len(), sources = txt.len(), "daily run finished");

    Ok(RunResponse {
        status: RunStatus::Ok,
        date: date_key(date),
        csv: csv.display().to_string(),
        records: table.len(),
        txt,
    })
}

/// Judge each source independently; one source failing never stops the rest.
pub fn judge_sources<S: ArtifactStore>(
    store: &S,
    predictors: &[PredictorConfig],
    date: NaiveDate,
    table: &PayoutTable,
) -> Vec<SourceOutcome> {
    predictors
        .iter()
        .map(|predictor| judge_source(store, predictor, date, table))
        .collect()
}

fn judge_source<S: ArtifactStore>(
    store: &S,
    predictor: &PredictorConfig,
    date: NaiveDate,
    table: &PayoutTable,
) -> SourceOutcome {
    let workbook = store.workbook_path(date, &predictor.file_prefix);
    let mut outcome = SourceOutcome {
        label: predictor.label.clone(),
        status: SourceStatus::Ok,
        txt: None,
        workbook: workbook.display().to_string(),
        hit_races: None,
    };

    let result = store
        .load_predictions(date, &predictor.file_prefix)
        .and_then(|book| match book {
            Some(book) => {
                let report = MarkMatcher::judge(table, &book);
                let path = store.save_report(date, &predictor.label, &report)?;
                Ok(Some((path, count_hit_races(&report))))
            }
            None => Ok(None),
        });

    match result {
        Ok(Some((path, hits))) => {
            info!(source = %predictor.label, hit_races = hits, "report written");
            outcome.txt = Some(path.display().to_string());
            outcome.hit_races = Some(hits);
        }
        Ok(None) => {
            warn!(source = %predictor.label, workbook = %outcome.workbook, "workbook missing");
            outcome.status = SourceStatus::WorkbookMissing;
        }
        Err(e) => {
            error!(source = %predictor.label, "judge failed: {:#}", e);
            outcome.status = SourceStatus::JudgeError;
        }
    }

    outcome
}

fn count_hit_races(report: &str) -> usize {
    report.split("\n\n").filter(|block| !block.trim().is_empty()).count()
}
