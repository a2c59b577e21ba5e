//! Invocation event decoding and the response payloads.

use serde::{Deserialize, Serialize};

use crate::Error;

/// The run identifier supplied by the caller. Only surfaced in logging.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RunIndex {
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for RunIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunIndex::Number(n) => write!(f, "{n}"),
            RunIndex::Text(s) => f.write_str(s),
        }
    }
}

/// The invocation input. All fields are required; a missing key fails the
/// invocation before anything is downloaded.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationEvent {
    /// Object key of the parameter set JSON.
    pub parameter_file: String,
    /// Object key of the input set JSON.
    pub input_file: String,
    /// Object key of the FMU archive.
    pub fmu_file: String,
    pub start_time: f64,
    pub end_time: f64,
    pub step_size: f64,
    pub index: RunIndex,
}

impl SimulationEvent {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, Error> {
        serde_json::from_value(value.clone()).map_err(|e| Error::MissingEventField(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    /// Wall-clock runtime, e.g. "1.25 second(s)".
    pub runtime: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl SuccessResponse {
    pub fn new(runtime_seconds: f64) -> Self {
        SuccessResponse {
            runtime: format!("{runtime_seconds} second(s)"),
            status_code: 200,
            body: "Ran successfully!".to_string(),
        }
    }
}

/// Failure responses carry only a body; the caller treats the absence of
/// `statusCode: 200` as failure.
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub body: String,
}

impl FailureResponse {
    pub fn from_error(err: &Error) -> Self {
        FailureResponse {
            body: format!("Error: {err}"),
        }
    }
}
