//! Request and response types for the keiba-refund API.

use serde::{Deserialize, Serialize};

/// Query of the daily run endpoint
#[derive(Debug, Default, Deserialize)]
pub struct RunQuery {
    /// `YYYYMMDD` or `YYYY-MM-DD`; today (JST) when absent
    pub date: Option<String>,
}

/// Overall outcome of a daily run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    /// No race produced payouts; the CSV is header-only
    NoData,
}

/// Outcome of one prediction source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    WorkbookMissing,
    JudgeError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub label: String,
    pub status: SourceStatus,
    /// Report path, present when the report was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txt: Option<String>,
    pub workbook: String,
    /// Number of races with at least one hit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_races: Option<usize>,
}

/// Daily run response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub status: RunStatus,
    /// `YYYYMMDD`
    pub date: String,
    /// Payout CSV path
    pub csv: String,
    pub records: usize,
    pub txt: Vec<SourceOutcome>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_response_json() {
        let response = RunResponse {
            status: RunStatus::NoData,
            date: "20251015".to_string(),
            csv: "results/20251015/pay_results_20251015.csv".to_string(),
            records: 0,
            txt: vec![SourceOutcome {
                label: "尻子".to_string(),
                status: SourceStatus::WorkbookMissing,
                txt: None,
                workbook: "predictions/20251015/尻子_予測結果_20251015.xlsx".to_string(),
                hit_races: None,
            }],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "no_data");
        assert_eq!(json["txt"][0]["status"], "workbook_missing");
        assert!(json["txt"][0].get("txt").is_none());
    }
}
