//! The fixed-step simulation core: binding resolution, the per-step call
//! contract, and the driver loop.

pub mod bindings;
pub mod driver;
pub mod traits;

pub use bindings::{resolve_bindings, Binding};
pub use driver::simulate;
pub use traits::{CallError, SimInstance};

use crate::{model::VariableDescriptor, Error};

/// One result row: `[time, inputs.., parameters.., outputs..]`.
pub type ResultRow = Vec<f64>;

/// Everything the driver needs for one run, built once per invocation from
/// the two JSON payloads and the model's declared variables.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub start_time: f64,
    pub end_time: f64,
    pub step_size: f64,
    /// Matched parameters, in parameter-payload order.
    pub parameters: Vec<Binding>,
    /// Matched inputs, in input-payload order.
    pub inputs: Vec<Binding>,
    /// All declared outputs, in model-declaration order.
    pub outputs: Vec<VariableDescriptor>,
}

impl SimulationConfig {
    /// A non-positive or non-finite step would never advance the loop, so it
    /// is rejected up front. `start_time >= end_time` is allowed and simply
    /// produces an empty run.
    pub fn new(
        start_time: f64,
        end_time: f64,
        step_size: f64,
        parameters: Vec<Binding>,
        inputs: Vec<Binding>,
        outputs: Vec<VariableDescriptor>,
    ) -> Result<Self, Error> {
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "step_size must be positive and finite, got {step_size}"
            )));
        }
        if !start_time.is_finite() || !end_time.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "simulation window [{start_time}, {end_time}] is not finite"
            )));
        }
        Ok(SimulationConfig {
            start_time,
            end_time,
            step_size,
            parameters,
            inputs,
            outputs,
        })
    }

    /// Nominal row count. The driver may produce one row more or less when
    /// `(end_time - start_time)` is not an exact multiple of `step_size`;
    /// that drift is accepted, not corrected.
    pub fn expected_steps(&self) -> usize {
        if self.end_time <= self.start_time {
            return 0;
        }
        ((self.end_time - self.start_time) / self.step_size).floor() as usize
    }

    /// Column count of every row: time + inputs + parameters + outputs.
    pub fn column_count(&self) -> usize {
        1 + self.inputs.len() + self.parameters.len() + self.outputs.len()
    }

    /// Header names in row order.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.column_count());
        names.push("time".to_string());
        names.extend(self.inputs.iter().map(|b| b.name.clone()));
        names.extend(self.parameters.iter().map(|b| b.name.clone()));
        names.extend(self.outputs.iter().map(|v| v.name.clone()));
        names
    }
}
