//! Persisted artifacts: the result CSV and the text report.

use std::path::Path;

use crate::{report::RunReport, sim::ResultRow, Error};

/// Write the result CSV: one header row (`time` + inputs + parameters +
/// outputs) and one data row per simulation step, values in their natural
/// decimal form.
pub fn write_csv(path: &Path, columns: &[String], rows: &[ResultRow]) -> Result<(), Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(row.iter().map(|value| value.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Render the seven labeled report lines under the title.
pub fn render_report(report: &RunReport) -> String {
    let rtf = report
        .real_time_factor()
        .map(|f| f.to_string())
        .unwrap_or_else(|| "undefined".to_string());
    format!(
        "Simulation Results\n\
         FMU file: {}\n\
         Start date: {}\n\
         End date: {}\n\
         Simulation start time: {}\n\
         Simulation end time: {}\n\
         Total runtime: {}\n\
         Real time factor (simulated time / real time): {}\n",
        report.fmu_file_name,
        report.start_date_label,
        report.end_date_label,
        report.simulation_start_time,
        report.simulation_end_time,
        report.total_runtime_seconds,
        rtf,
    )
}

pub fn write_report(path: &Path, report: &RunReport) -> Result<(), Error> {
    std::fs::write(path, render_report(report))?;
    Ok(())
}
