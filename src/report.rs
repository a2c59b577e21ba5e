//! Run-report record, built once at the end of a run.

/// Summary of one completed run. Construction is pure; formatting and
/// persistence live in [`crate::output`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub fmu_file_name: String,
    pub start_date_label: String,
    pub end_date_label: String,
    pub simulation_start_time: f64,
    pub simulation_end_time: f64,
    pub total_runtime_seconds: f64,
}

impl RunReport {
    pub fn new(
        fmu_file_name: impl Into<String>,
        start_date_label: impl Into<String>,
        end_date_label: impl Into<String>,
        simulation_start_time: f64,
        simulation_end_time: f64,
        total_runtime_seconds: f64,
    ) -> Self {
        RunReport {
            fmu_file_name: fmu_file_name.into(),
            start_date_label: start_date_label.into(),
            end_date_label: end_date_label.into(),
            simulation_start_time,
            simulation_end_time,
            total_runtime_seconds,
        }
    }

    /// Ratio of simulated time to wall-clock time. `None` when the run
    /// completed faster than the clock resolution, where the ratio is
    /// undefined.
    pub fn real_time_factor(&self) -> Option<f64> {
        (self.total_runtime_seconds > 0.0)
            .then(|| (self.simulation_end_time - self.simulation_start_time) / self.total_runtime_seconds)
    }
}
