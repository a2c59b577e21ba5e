//! Run a packaged FMU (Functional Mock-up Unit) simulation from object storage.
//!
//! One invocation performs one run: the parameter set, input set and FMU
//! archive are downloaded from the input bucket, the model is stepped through
//! a fixed-step loop, and a CSV of time-series results plus a text report are
//! uploaded to the results bucket. There is no retry, caching or concurrency;
//! every failure is terminal for the invocation.
//!
//! The external collaborators sit behind narrow seams:
//! * [`storage::ObjectStorage`] for download-by-key / upload-by-path,
//! * [`model::ModelBackend`] for reading a model description and
//!   instantiating the FMI runtime,
//! * [`sim::SimInstance`] for the per-step call contract.

pub mod config;
pub mod event;
pub mod fmu;
pub mod handler;
pub mod model;
pub mod output;
pub mod report;
pub mod sim;
pub mod storage;

use sim::CallError;
use storage::StorageError;

/// The storage artifact an operation was acting on.
///
/// Each artifact keeps its own wording so that a failed parameter download,
/// input download and FMU download remain distinguishable from the failure
/// body alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    ParameterSet,
    InputSet,
    FmuArchive,
    Report,
    ResultCsv,
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Artifact::ParameterSet => "the parameter set file",
            Artifact::InputSet => "the input set file",
            Artifact::FmuArchive => "the specified FMU file",
            Artifact::Report => "the simulation report",
            Artifact::ResultCsv => "the result CSV",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("event data missing required information (parameter_file, input_file, fmu_file, start_time, end_time, step_size, index): {0}")]
    MissingEventField(String),

    #[error("could not find {artifact} '{key}' in the input bucket: {reason}")]
    Download {
        artifact: Artifact,
        key: String,
        reason: StorageError,
    },

    #[error("could not upload {artifact} '{key}' to the results bucket: {reason}")]
    Upload {
        artifact: Artifact,
        key: String,
        reason: StorageError,
    },

    #[error("the FMU declares neither a co-simulation nor a model-exchange interface")]
    UnsupportedInterface,

    #[error("could not initialize the FMU, the archive may be missing binaries for this platform: {0}")]
    ModelInit(String),

    #[error("invalid simulation configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to set {kind} values at t = {time}: the model may not allow parameters/inputs to be set at runtime ({reason})")]
    BindingRejected {
        kind: &'static str,
        time: f64,
        reason: CallError,
    },

    #[error("simulation step starting at t = {time} failed: {reason}")]
    Step { time: f64, reason: CallError },

    #[error("failed to read values back from the model at t = {time}: {reason}")]
    Readback { time: f64, reason: CallError },

    #[error("failed to terminate the model instance: {0}")]
    Terminate(CallError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
