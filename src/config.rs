//! Runner configuration.
//!
//! Bucket names and the scratch directory are injected into the handler
//! rather than read from globals, so tests can point the runner at a
//! temporary directory and an in-memory store.

use std::path::PathBuf;

pub const DEFAULT_INPUT_BUCKET: &str = "fmpy-bucket";
pub const DEFAULT_RESULTS_BUCKET: &str = "simulate-fmu-results-bucket";
pub const DEFAULT_WORK_DIR: &str = "/tmp";

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Bucket holding the FMU archive, parameter set and input set.
    pub input_bucket: String,
    /// Bucket receiving the report and result CSV.
    pub results_bucket: String,
    /// Writable scratch directory for downloaded and generated files.
    pub work_dir: PathBuf,
}

impl RunnerConfig {
    /// Build a config from `FMU_INPUT_BUCKET`, `FMU_RESULTS_BUCKET` and
    /// `FMU_WORK_DIR`, falling back to the historical defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        RunnerConfig {
            input_bucket: lookup("FMU_INPUT_BUCKET")
                .unwrap_or_else(|| DEFAULT_INPUT_BUCKET.to_string()),
            results_bucket: lookup("FMU_RESULTS_BUCKET")
                .unwrap_or_else(|| DEFAULT_RESULTS_BUCKET.to_string()),
            work_dir: lookup("FMU_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORK_DIR)),
        }
    }
}
