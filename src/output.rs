//! Output sinks for chart payloads and cleaned tables.
//!
//! Supports a plain-text table, JSON, and CSV files.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::chart::ChartData;

/// Logs a chart using Rust's debug pretty-print format.
pub fn print_pretty(chart: &ChartData) {
    debug!("{:#?}", chart);
}

/// Writes any serializable value as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write>(mut out: W, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Writes a chart as an aligned text table, or a "no data" line when empty.
pub fn write_table<W: Write>(mut out: W, chart: &ChartData) -> Result<()> {
    writeln!(out, "{}", chart.title())?;

    if chart.is_empty() {
        writeln!(out, "(no data for the selected filters)")?;
        return Ok(());
    }

    let rows: Vec<(String, String)> = match chart {
        ChartData::Pie { slices, .. } => slices
            .iter()
            .map(|s| (s.label.clone(), format!("{} ({:.1}%)", s.value, s.percent)))
            .collect(),
        other => other
            .series()
            .into_iter()
            .map(|(label, value)| (label, format!("{value}")))
            .collect(),
    };

    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, value) in rows {
        writeln!(out, "  {label:<width$}  {value}")?;
    }

    Ok(())
}

/// Writes the chart's `(label, value)` series as CSV with a header row.
pub fn write_series_csv<W: Write>(out: W, chart: &ChartData) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(out);
    writer.write_record(["label", "value"])?;
    for (label, value) in chart.series() {
        writer.write_record([label, value.to_string()])?;
    }
    writer.flush()?;

    Ok(())
}

/// Serializes every record as a row of a fresh CSV file with headers.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    debug!(path = %path.display(), rows = records.len(), "Writing records CSV");

    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}
