//! Export of prediction history and statistics.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::Serialize;
use spamwatch_common::schemas::StatisticsResponse;
use spamwatch_common::{now_iso, HistoryEntry};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn default_filename(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "spam_predictions.csv",
            ExportFormat::Json => "model_statistics.json",
        }
    }
}

const CSV_HEADER: &str = "Timestamp,Message Preview,Prediction,Confidence (%)";

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn display_timestamp(raw: &str) -> String {
    if raw.is_empty() {
        return "N/A".to_string();
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// History entries as CSV, header first.
pub fn history_to_csv(entries: &[HistoryEntry]) -> String {
    let mut lines = vec![CSV_HEADER.to_string()];
    for entry in entries {
        lines.push(format!(
            "{},{},{},{:.2}",
            quote(&display_timestamp(&entry.timestamp)),
            quote(&entry.message),
            entry.prediction.as_str().to_uppercase(),
            entry.confidence
        ));
    }
    lines.join("\n")
}

#[derive(Serialize)]
struct StatisticsExport<'a> {
    exported_at: String,
    statistics: &'a StatisticsResponse,
}

/// Statistics snapshot as pretty JSON.
pub fn statistics_to_json(stats: &StatisticsResponse) -> Result<String> {
    let export = StatisticsExport {
        exported_at: now_iso(),
        statistics: stats,
    };
    serde_json::to_string_pretty(&export).context("Failed to serialize statistics")
}

/// Render the export and write it to `path`.
pub fn write_export(format: ExportFormat, stats: &StatisticsResponse, path: &Path) -> Result<usize> {
    if stats.recent_predictions.is_empty() {
        anyhow::bail!("No prediction data available to export");
    }
    let content = match format {
        ExportFormat::Csv => history_to_csv(&stats.recent_predictions),
        ExportFormat::Json => statistics_to_json(stats)?,
    };
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(stats.recent_predictions.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spamwatch_common::Label;

    fn entry(message: &str, prediction: Label, confidence: f64) -> HistoryEntry {
        HistoryEntry {
            message: message.to_string(),
            prediction,
            confidence,
            timestamp: "2026-10-17T09:30:05.123456".to_string(),
        }
    }

    fn stats(entries: Vec<HistoryEntry>) -> StatisticsResponse {
        StatisticsResponse {
            accuracy: 0.9847,
            precision: 0.9823,
            recall: 0.9756,
            f1_score: 0.9789,
            total_predictions: entries.len(),
            spam_count: 0,
            ham_count: 0,
            recent_predictions: entries,
        }
    }

    #[test]
    fn test_default_filenames() {
        assert_eq!(ExportFormat::Csv.default_filename(), "spam_predictions.csv");
        assert_eq!(ExportFormat::Json.default_filename(), "model_statistics.json");
    }

    #[test]
    fn test_csv_rows() {
        let csv = history_to_csv(&[
            entry("Win a \"free\" prize", Label::Spam, 97.5),
            entry("lunch?", Label::Ham, 88.126),
        ]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "\"2026-10-17 09:30:05\",\"Win a \"\"free\"\" prize\",SPAM,97.50"
        );
        assert_eq!(lines[2], "\"2026-10-17 09:30:05\",\"lunch?\",HAM,88.13");
    }

    #[test]
    fn test_unparseable_timestamp_kept() {
        let mut e = entry("hello", Label::Ham, 60.0);
        e.timestamp = "yesterday".to_string();
        assert!(history_to_csv(&[e]).contains("\"yesterday\""));

        let mut e = entry("hello", Label::Ham, 60.0);
        e.timestamp.clear();
        assert!(history_to_csv(&[e]).contains("\"N/A\""));
    }

    #[test]
    fn test_json_export_wraps_statistics() {
        let json = statistics_to_json(&stats(vec![entry("hi there", Label::Ham, 70.0)])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["statistics"]["accuracy"], 0.9847);
        assert_eq!(value["statistics"]["recent_predictions"][0]["prediction"], "ham");
        assert!(value["exported_at"].is_string());
    }

    #[test]
    fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let written = write_export(
            ExportFormat::Csv,
            &stats(vec![entry("a", Label::Spam, 99.0), entry("b", Label::Ham, 51.0)]),
            &path,
        )
        .unwrap();
        assert_eq!(written, 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_empty_history_not_exported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        assert!(write_export(ExportFormat::Json, &stats(vec![]), &path).is_err());
        assert!(!path.exists());
    }
}
