//! The fixed-step simulation driver.
//!
//! Time advances from `start_time` under a strict `t < end_time` guard; when
//! the window is not an exact multiple of the step size the accumulated
//! floating-point drift can add or drop a final sample. That matches the
//! original tool's output and is left uncorrected.

use super::{
    traits::{CallError, SimInstance},
    ResultRow, SimulationConfig,
};
use crate::Error;

/// Drive one run to completion and collect the result rows.
///
/// Parameters and inputs are re-applied on every step (idempotent
/// re-assertion; parameters are nominally constant but the model is told so
/// each time). A rejected write aborts the whole run with no partial result.
/// The instance is terminated on every exit path before the error surfaces.
pub fn simulate<I: SimInstance>(
    mut instance: I,
    config: &SimulationConfig,
) -> Result<Vec<ResultRow>, Error> {
    let outcome = run_loop(&mut instance, config);
    let shutdown = instance.terminate();

    let rows = match outcome {
        Ok(rows) => rows,
        Err(err) => {
            if let Err(term) = shutdown {
                log::warn!("Terminate after failed run also failed: {term}");
            }
            return Err(err);
        }
    };
    shutdown.map_err(Error::Terminate)?;
    Ok(rows)
}

fn run_loop<I: SimInstance>(
    instance: &mut I,
    config: &SimulationConfig,
) -> Result<Vec<ResultRow>, Error> {
    let parameter_vrs: Vec<u32> = config.parameters.iter().map(|b| b.value_reference).collect();
    let parameter_values: Vec<f64> = config.parameters.iter().map(|b| b.value).collect();
    let input_vrs: Vec<u32> = config.inputs.iter().map(|b| b.value_reference).collect();
    let input_values: Vec<f64> = config.inputs.iter().map(|b| b.value).collect();
    let output_vrs: Vec<u32> = config.outputs.iter().map(|v| v.value_reference).collect();

    let mut input_readback = vec![0.0; input_vrs.len()];
    let mut output_readback = vec![0.0; output_vrs.len()];
    let mut rows = Vec::with_capacity(config.expected_steps());

    let mut time = config.start_time;
    while time < config.end_time {
        apply(instance, &parameter_vrs, &parameter_values, "parameter", time)?;
        apply(instance, &input_vrs, &input_values, "input", time)?;

        instance
            .advance(time, config.step_size)
            .map_err(|reason| Error::Step { time, reason })?;
        time += config.step_size;

        read(instance, &input_vrs, &mut input_readback, time)?;
        read(instance, &output_vrs, &mut output_readback, time)?;

        // Inputs and outputs are read back live; parameter columns record
        // the values that were set, not what the model reports back.
        let mut row = Vec::with_capacity(config.column_count());
        row.push(time);
        row.extend_from_slice(&input_readback);
        row.extend_from_slice(&parameter_values);
        row.extend_from_slice(&output_readback);
        rows.push(row);

        log::trace!("t = {time}: {} row(s) recorded", rows.len());
    }

    log::info!(
        "Simulation finished at t = {time} after {} step(s)",
        rows.len()
    );
    Ok(rows)
}

fn apply<I: SimInstance>(
    instance: &mut I,
    vrs: &[u32],
    values: &[f64],
    kind: &'static str,
    time: f64,
) -> Result<(), Error> {
    if vrs.is_empty() {
        return Ok(());
    }
    instance
        .set_reals(vrs, values)
        .map_err(|reason| Error::BindingRejected { kind, time, reason })
}

fn read<I: SimInstance>(
    instance: &mut I,
    vrs: &[u32],
    values: &mut [f64],
    time: f64,
) -> Result<(), Error> {
    if vrs.is_empty() {
        return Ok(());
    }
    instance
        .get_reals(vrs, values)
        .map_err(|reason| Error::Readback { time, reason })
}
