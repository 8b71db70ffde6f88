//! HTML report rendering.

use std::path::Path;

use anyhow::{Context, Result};
use askama::Template;
use chrono::{DateTime, Local};

use crate::analysis::{AnomalyEntry, Analysis};
use crate::parse::DISPLAY_FORMAT;

struct OutlierRow {
    timestamp: String,
    level: String,
    level_class: String,
    message: String,
}

struct SpikeRow {
    time: String,
    count: usize,
    message: String,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportPage<'a> {
    total_logs: usize,
    anomaly_rate: String,
    analysis_time: String,
    generated_at: String,
    algorithm: &'a str,
    skipped_lines: usize,
    rows: Vec<OutlierRow>,
    spikes: Vec<SpikeRow>,
}

/// Render the report for `analysis`, stamped with `now`.
pub fn render(analysis: &Analysis, now: DateTime<Local>) -> Result<String> {
    let result = &analysis.result;

    let rows = result
        .outliers_by_time()
        .into_iter()
        .map(|v| {
            let level = v.record.level();
            OutlierRow {
                timestamp: v.record.record.timestamp.format(DISPLAY_FORMAT).to_string(),
                level: level.to_string(),
                level_class: level.as_str().to_lowercase(),
                message: v.record.record.message.clone(),
            }
        })
        .collect();

    let spikes = result
        .spike_entries()
        .into_iter()
        .filter_map(|entry| match entry {
            AnomalyEntry::Spike {
                time,
                count,
                message,
            } => Some(SpikeRow {
                time,
                count,
                message,
            }),
            AnomalyEntry::Outlier { .. } => None,
        })
        .collect();

    let page = ReportPage {
        total_logs: result.total_records,
        anomaly_rate: format!("{:.1}", result.anomaly_rate()),
        analysis_time: now.format("%H:%M").to_string(),
        generated_at: now.format("%Y-%m-%d at %H:%M:%S").to_string(),
        algorithm: analysis.model_name,
        skipped_lines: analysis.skipped_lines,
        rows,
        spikes,
    };

    page.render().context("failed to render report template")
}

/// Render the report and write it to `output`.
pub fn write_report(analysis: &Analysis, output: &Path) -> Result<()> {
    let html = render(analysis, Local::now())?;
    std::fs::write(output, html)
        .with_context(|| format!("failed to write report: {}", output.display()))?;
    tracing::info!(
        output = %output.display(),
        anomalies = analysis.result.outlier_anomalies.len(),
        total = analysis.result.total_records,
        "report written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_text;
    use crate::config::DetectionConfig;

    fn now() -> DateTime<Local> {
        Local::now()
    }

    #[test]
    fn test_empty_report_has_no_anomalies_panel() {
        let analysis = analyze_text("", &DetectionConfig::default()).unwrap();
        let html = render(&analysis, now()).unwrap();
        assert!(html.contains("No Anomalies Detected"));
        assert!(html.contains("0.0%"));
        assert!(!html.contains("<h2>Error Spikes</h2>"));
    }

    #[test]
    fn test_report_lists_spikes_and_escapes_messages() {
        let mut text: String = (0..4)
            .map(|i| format!("2024-01-01 10:00:0{} ERROR db timeout\n", i))
            .collect();
        for i in 0..30 {
            text.push_str(&format!("2024-01-01 10:01:{:02} INFO ok\n", i));
        }
        text.push_str("2024-01-01 10:02:00 CRITICAL <script>alert(1)</script> and a very long tail of text\n");

        let analysis = analyze_text(&text, &DetectionConfig::default()).unwrap();
        let html = render(&analysis, now()).unwrap();

        assert!(html.contains("<h2>Error Spikes</h2>"));
        assert!(html.contains("4 ERROR logs in 30 seconds"));
        assert!(html.contains("Isolation Forest"));
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("anomaly_results.html");
        let analysis = analyze_text("", &DetectionConfig::default()).unwrap();
        write_report(&analysis, &out).unwrap();
        assert!(std::fs::read_to_string(out).unwrap().contains("<!DOCTYPE html>"));
    }
}
