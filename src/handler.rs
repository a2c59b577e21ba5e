//! Orchestration of one invocation: download, bind, simulate, upload.

use std::{path::Path, time::Instant};

use chrono::Local;

use crate::{
    config::RunnerConfig,
    event::{SimulationEvent, SuccessResponse},
    model::{LoadedModel, ModelBackend},
    output,
    report::RunReport,
    sim::{self, resolve_bindings, SimulationConfig},
    storage::ObjectStorage,
    Artifact, Error,
};

/// Timestamp label used in artifact names.
const DATE_LABEL: &str = "%Y_%m_%d_%H_%M_%S";

/// Run one simulation to completion. Every failure is terminal: nothing is
/// retried, and no partial result CSV is uploaded.
pub async fn handle<S, B>(
    payload: &serde_json::Value,
    config: &RunnerConfig,
    storage: &S,
    backend: &B,
) -> Result<SuccessResponse, Error>
where
    S: ObjectStorage,
    B: ModelBackend,
{
    let wall_start = Instant::now();
    let start_label = Local::now().format(DATE_LABEL).to_string();

    let event = SimulationEvent::from_value(payload)?;
    log::info!(
        "Run {} of FMU '{}' over [{}, {}] with step {}",
        event.index,
        event.fmu_file,
        event.start_time,
        event.end_time,
        event.step_size
    );

    let parameter_path = config.work_dir.join(base_name(&event.parameter_file));
    let input_path = config.work_dir.join(base_name(&event.input_file));
    let fmu_path = config.work_dir.join(base_name(&event.fmu_file));

    fetch(storage, config, &event.parameter_file, &parameter_path, Artifact::ParameterSet).await?;
    fetch(storage, config, &event.input_file, &input_path, Artifact::InputSet).await?;
    fetch(storage, config, &event.fmu_file, &fmu_path, Artifact::FmuArchive).await?;

    log::info!("Reading parameter and input sets...");
    let parameter_json = read_object(&parameter_path)?;
    let input_json = read_object(&input_path)?;

    let model = backend.load(&fmu_path)?;
    let description = model.description();
    for variable in &description.variables {
        log::debug!(
            "Declared variable '{}' (vr = {}, {:?})",
            variable.name,
            variable.value_reference,
            variable.causality
        );
    }

    let parameters = resolve_bindings(&parameter_json, &description.variables)?;
    let inputs = resolve_bindings(&input_json, &description.variables)?;
    let outputs = description.outputs().cloned().collect();
    let sim_config = SimulationConfig::new(
        event.start_time,
        event.end_time,
        event.step_size,
        parameters,
        inputs,
        outputs,
    )?;

    let interface = description.select_interface()?;
    log::info!(
        "Initializing {interface} simulation of '{}'",
        description.model_name
    );
    let instance = model.instantiate(interface, event.start_time, event.end_time)?;

    log::info!("Running simulation...");
    let rows = sim::simulate(instance, &sim_config)?;

    let runtime_seconds = wall_start.elapsed().as_secs_f64();
    let end_date = Local::now();
    let report = RunReport::new(
        event.fmu_file.clone(),
        start_label.clone(),
        end_date.format("%Y-%m-%d %H:%M:%S").to_string(),
        event.start_time,
        event.end_time,
        runtime_seconds,
    );

    let report_key = format!("{}{}.txt", event.fmu_file, start_label);
    let report_path = config.work_dir.join(base_name(&report_key));
    output::write_report(&report_path, &report)?;
    store(storage, config, &report_path, &report_key, Artifact::Report).await?;

    log::info!("Writing results to file...");
    let csv_key = format!("{}_{}_.csv", event.fmu_file, end_date.format(DATE_LABEL));
    let csv_path = config.work_dir.join(base_name(&csv_key));
    output::write_csv(&csv_path, &sim_config.column_names(), &rows)?;
    store(storage, config, &csv_path, &csv_key, Artifact::ResultCsv).await?;

    Ok(SuccessResponse::new(runtime_seconds))
}

async fn fetch<S: ObjectStorage>(
    storage: &S,
    config: &RunnerConfig,
    key: &str,
    dest: &Path,
    artifact: Artifact,
) -> Result<(), Error> {
    storage
        .download(&config.input_bucket, key, dest)
        .await
        .map_err(|reason| Error::Download {
            artifact,
            key: key.to_string(),
            reason,
        })
}

async fn store<S: ObjectStorage>(
    storage: &S,
    config: &RunnerConfig,
    src: &Path,
    key: &str,
    artifact: Artifact,
) -> Result<(), Error> {
    storage
        .upload(src, &config.results_bucket, key)
        .await
        .map_err(|reason| Error::Upload {
            artifact,
            key: key.to_string(),
            reason,
        })
}

fn read_object(path: &Path) -> Result<serde_json::Map<String, serde_json::Value>, Error> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn base_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
