//! End-to-end handler tests with an in-memory object store and a scripted
//! model backend standing in for the external collaborators.

use std::{
    collections::HashMap,
    path::Path,
    sync::Mutex,
};

use serde_json::json;

use fmu_sim_lambda::{
    config::RunnerConfig,
    event::FailureResponse,
    handler,
    model::{
        Causality, InterfaceKind, LoadedModel, ModelBackend, ModelDescription, VariableDescriptor,
    },
    sim::{CallError, SimInstance},
    storage::{ObjectStorage, StorageError},
    Error,
};

const VR_K: u32 = 1;
const VR_U: u32 = 2;
const VR_Y: u32 = 10;

struct MemoryStorage {
    objects: HashMap<String, Vec<u8>>,
    uploaded: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    fn new(objects: &[(&str, &[u8])]) -> Self {
        MemoryStorage {
            objects: objects
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_vec()))
                .collect(),
            uploaded: Mutex::new(HashMap::new()),
        }
    }

    fn uploaded_key_ending_with(&self, suffix: &str) -> Option<(String, String)> {
        let uploaded = self.uploaded.lock().unwrap();
        uploaded
            .iter()
            .find(|(key, _)| key.ends_with(suffix))
            .map(|(key, bytes)| (key.clone(), String::from_utf8(bytes.clone()).unwrap()))
    }
}

impl ObjectStorage for MemoryStorage {
    async fn download(&self, _bucket: &str, key: &str, dest: &Path) -> Result<(), StorageError> {
        let Some(bytes) = self.objects.get(key) else {
            return Err(StorageError::new("NoSuchKey"));
        };
        std::fs::write(dest, bytes).map_err(|e| StorageError::new(e.to_string()))
    }

    async fn upload(&self, src: &Path, _bucket: &str, key: &str) -> Result<(), StorageError> {
        let bytes = std::fs::read(src).map_err(|e| StorageError::new(e.to_string()))?;
        self.uploaded.lock().unwrap().insert(key.to_string(), bytes);
        Ok(())
    }
}

/// Pure gain model: y = k * u, recomputed on every step.
struct GainBackend {
    supports_co_simulation: bool,
    supports_model_exchange: bool,
    reject_writes: bool,
}

impl GainBackend {
    fn new() -> Self {
        GainBackend {
            supports_co_simulation: true,
            supports_model_exchange: false,
            reject_writes: false,
        }
    }

    fn description(&self) -> ModelDescription {
        ModelDescription {
            model_name: "Gain".to_string(),
            variables: vec![
                VariableDescriptor {
                    name: "k".to_string(),
                    value_reference: VR_K,
                    causality: Causality::Parameter,
                },
                VariableDescriptor {
                    name: "u".to_string(),
                    value_reference: VR_U,
                    causality: Causality::Input,
                },
                VariableDescriptor {
                    name: "hidden".to_string(),
                    value_reference: 99,
                    causality: Causality::Local,
                },
                VariableDescriptor {
                    name: "y".to_string(),
                    value_reference: VR_Y,
                    causality: Causality::Output,
                },
            ],
            supports_co_simulation: self.supports_co_simulation,
            supports_model_exchange: self.supports_model_exchange,
        }
    }
}

struct GainModel {
    description: ModelDescription,
    reject_writes: bool,
}

impl ModelBackend for GainBackend {
    type Model = GainModel;

    fn load(&self, path: &Path) -> Result<GainModel, Error> {
        // The archive must actually have been downloaded first.
        assert_eq!(std::fs::read(path).unwrap(), b"fmu-bytes");
        Ok(GainModel {
            description: self.description(),
            reject_writes: self.reject_writes,
        })
    }
}

impl LoadedModel for GainModel {
    type Instance<'a>
        = GainInstance
    where
        Self: 'a;

    fn description(&self) -> &ModelDescription {
        &self.description
    }

    fn instantiate(
        &self,
        interface: InterfaceKind,
        _start_time: f64,
        _stop_time: f64,
    ) -> Result<GainInstance, Error> {
        assert_eq!(interface, InterfaceKind::CoSimulation);
        Ok(GainInstance {
            store: HashMap::from([(VR_K, 0.0), (VR_U, 0.0), (VR_Y, 0.0)]),
            reject_writes: self.reject_writes,
        })
    }
}

struct GainInstance {
    store: HashMap<u32, f64>,
    reject_writes: bool,
}

impl SimInstance for GainInstance {
    fn set_reals(&mut self, vrs: &[u32], values: &[f64]) -> Result<(), CallError> {
        if self.reject_writes {
            return Err(CallError::new("fmi2SetReal returned status 3"));
        }
        for (vr, value) in vrs.iter().zip(values) {
            self.store.insert(*vr, *value);
        }
        Ok(())
    }

    fn get_reals(&mut self, vrs: &[u32], values: &mut [f64]) -> Result<(), CallError> {
        for (vr, slot) in vrs.iter().zip(values.iter_mut()) {
            *slot = self.store[vr];
        }
        Ok(())
    }

    fn advance(&mut self, _current_time: f64, _step_size: f64) -> Result<(), CallError> {
        let y = self.store[&VR_K] * self.store[&VR_U];
        self.store.insert(VR_Y, y);
        Ok(())
    }

    fn terminate(&mut self) -> Result<(), CallError> {
        Ok(())
    }
}

fn event() -> serde_json::Value {
    json!({
        "parameter_file": "Gain_pSets.json",
        "input_file": "Gain_iSet.json",
        "fmu_file": "Gain.fmu",
        "start_time": 0.0,
        "end_time": 1.0,
        "step_size": 0.5,
        "index": 1,
    })
}

fn storage_with_all_objects() -> MemoryStorage {
    MemoryStorage::new(&[
        ("Gain_pSets.json", br#"{"k": 2.0, "ghost": 9.0}"#),
        ("Gain_iSet.json", br#"{"u": 3.0}"#),
        ("Gain.fmu", b"fmu-bytes"),
    ])
}

fn config(work_dir: &Path) -> RunnerConfig {
    RunnerConfig {
        input_bucket: "inputs".to_string(),
        results_bucket: "results".to_string(),
        work_dir: work_dir.to_path_buf(),
    }
}

#[tokio::test]
async fn successful_run_uploads_report_then_csv() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage_with_all_objects();
    let backend = GainBackend::new();

    let response = handler::handle(&event(), &config(dir.path()), &storage, &backend)
        .await
        .unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "Ran successfully!");
    assert!(response.runtime.ends_with("second(s)"));

    let (csv_key, csv_text) = storage.uploaded_key_ending_with("_.csv").unwrap();
    assert!(csv_key.starts_with("Gain.fmu_"));
    let lines: Vec<_> = csv_text.lines().collect();
    // "ghost" was requested but not declared, so it appears nowhere.
    assert_eq!(lines, ["time,u,k,y", "0.5,3,2,6", "1,3,2,6"]);

    let (report_key, report_text) = storage.uploaded_key_ending_with(".txt").unwrap();
    assert!(report_key.starts_with("Gain.fmu"));
    assert!(report_text.starts_with("Simulation Results\nFMU file: Gain.fmu\n"));
    assert!(report_text.contains("Simulation end time: 1\n"));
}

#[tokio::test]
async fn missing_event_field_fails_before_any_download() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage_with_all_objects();
    let backend = GainBackend::new();

    let mut payload = event();
    payload.as_object_mut().unwrap().remove("fmu_file");
    let err = handler::handle(&payload, &config(dir.path()), &storage, &backend)
        .await
        .unwrap_err();
    let body = FailureResponse::from_error(&err).body;
    assert!(body.contains("event data missing required information"));
    assert!(storage.uploaded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn download_failures_name_the_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let backend = GainBackend::new();

    let no_fmu = MemoryStorage::new(&[
        ("Gain_pSets.json", br#"{"k": 2.0}"#),
        ("Gain_iSet.json", br#"{"u": 3.0}"#),
    ]);
    let err = handler::handle(&event(), &config(dir.path()), &no_fmu, &backend)
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("the specified FMU file 'Gain.fmu'"));

    let no_parameters = MemoryStorage::new(&[("Gain.fmu", b"fmu-bytes")]);
    let err = handler::handle(&event(), &config(dir.path()), &no_parameters, &backend)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("the parameter set file"));
}

#[tokio::test]
async fn model_without_any_interface_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage_with_all_objects();
    let mut backend = GainBackend::new();
    backend.supports_co_simulation = false;
    backend.supports_model_exchange = false;

    let err = handler::handle(&event(), &config(dir.path()), &storage, &backend)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedInterface));
    assert!(storage.uploaded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rejected_write_uploads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage_with_all_objects();
    let mut backend = GainBackend::new();
    backend.reject_writes = true;

    let err = handler::handle(&event(), &config(dir.path()), &storage, &backend)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BindingRejected { .. }));
    assert!(err
        .to_string()
        .contains("may not allow parameters/inputs to be set"));
    assert!(storage.uploaded.lock().unwrap().is_empty());
}
