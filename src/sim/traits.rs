//! The per-step call contract between the driver and the model runtime.

/// Failure reason reported by the model runtime for a single call. The
/// driver attaches the surrounding context (what was being set, at which
/// communication point).
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct CallError(pub String);

impl CallError {
    pub fn new(reason: impl Into<String>) -> Self {
        CallError(reason.into())
    }
}

/// An initialized, running model instance.
///
/// Implementations wrap the FMI runtime (co-simulation `doStep`, or
/// model-exchange with an internal fixed-step integrator); tests use
/// scripted mocks. Dropping an instance releases the underlying handle, so
/// the driver only needs to guarantee that [`SimInstance::terminate`] is
/// attempted on every exit path.
pub trait SimInstance {
    /// Write values by value reference. Slices have equal length.
    fn set_reals(&mut self, vrs: &[u32], values: &[f64]) -> Result<(), CallError>;

    /// Read current values by value reference into `values`.
    fn get_reals(&mut self, vrs: &[u32], values: &mut [f64]) -> Result<(), CallError>;

    /// Advance the model by one communication step of `step_size` starting
    /// at `current_time`.
    fn advance(&mut self, current_time: f64, step_size: f64) -> Result<(), CallError>;

    /// Graceful shutdown. Called exactly once per run, on both the success
    /// and the failure path.
    fn terminate(&mut self) -> Result<(), CallError>;
}
