//! FMI-backed model backend.
//!
//! Wraps the `fmi` crate: archive extraction, the parsed model description,
//! and FMI 2.0 instances. Co-simulation instances advance with one `doStep`
//! per communication step; model-exchange instances are integrated with a
//! fixed-step forward-Euler scheme and basic event handling.

use std::path::Path;

use fmi::{
    fmi2::{
        import::Fmi2Import,
        instance::{Common, CoSimulation, InstanceCS, InstanceME, ModelExchange},
    },
    schema::fmi2 as schema,
    traits::FmiImport,
    EventFlags,
};

use crate::{
    model::{Causality, InterfaceKind, LoadedModel, ModelBackend, ModelDescription, VariableDescriptor},
    sim::{CallError, SimInstance},
    Error,
};

const INSTANCE_NAME: &str = "instance1";

#[derive(Debug, Default)]
pub struct FmuBackend;

pub struct FmuModel {
    import: Fmi2Import,
    description: ModelDescription,
}

impl ModelBackend for FmuBackend {
    type Model = FmuModel;

    fn load(&self, path: &Path) -> Result<FmuModel, Error> {
        log::info!("Extracting FMU archive {path:?}");
        let import: Fmi2Import =
            fmi::import::from_path(path).map_err(|e| Error::ModelInit(e.to_string()))?;
        let description = describe(import.model_description());
        log::debug!(
            "Model '{}' declares {} variables (CS: {}, ME: {})",
            description.model_name,
            description.variables.len(),
            description.supports_co_simulation,
            description.supports_model_exchange,
        );
        Ok(FmuModel {
            import,
            description,
        })
    }
}

impl LoadedModel for FmuModel {
    type Instance<'a>
        = FmuInstance
    where
        Self: 'a;

    fn description(&self) -> &ModelDescription {
        &self.description
    }

    fn instantiate(
        &self,
        interface: InterfaceKind,
        start_time: f64,
        stop_time: f64,
    ) -> Result<FmuInstance, Error> {
        match interface {
            InterfaceKind::CoSimulation => {
                let mut inst = self
                    .import
                    .instantiate_cs(INSTANCE_NAME, false, false)
                    .map_err(init_err)?;
                initialize(&mut inst, start_time, stop_time)?;
                Ok(FmuInstance::CoSimulation(inst))
            }
            InterfaceKind::ModelExchange => {
                let mut inst = self
                    .import
                    .instantiate_me(INSTANCE_NAME, false, false)
                    .map_err(init_err)?;
                initialize(&mut inst, start_time, stop_time)?;
                let nx = self.import.model_description().num_states();
                let mut driver = MeDriver {
                    inst,
                    states: vec![0.0; nx],
                    derivatives: vec![0.0; nx],
                };
                driver.begin_continuous_time().map_err(init_err)?;
                Ok(FmuInstance::ModelExchange(driver))
            }
        }
    }
}

/// An initialized FMI 2.0 instance behind the driver's call contract.
pub enum FmuInstance {
    CoSimulation(InstanceCS),
    ModelExchange(MeDriver),
}

impl SimInstance for FmuInstance {
    fn set_reals(&mut self, vrs: &[u32], values: &[f64]) -> Result<(), CallError> {
        match self {
            FmuInstance::CoSimulation(inst) => inst.set_real(vrs, values).map_err(call_err)?,
            FmuInstance::ModelExchange(me) => me.inst.set_real(vrs, values).map_err(call_err)?,
        };
        Ok(())
    }

    fn get_reals(&mut self, vrs: &[u32], values: &mut [f64]) -> Result<(), CallError> {
        match self {
            FmuInstance::CoSimulation(inst) => inst.get_real(vrs, values).map_err(call_err)?,
            FmuInstance::ModelExchange(me) => me.inst.get_real(vrs, values).map_err(call_err)?,
        };
        Ok(())
    }

    fn advance(&mut self, current_time: f64, step_size: f64) -> Result<(), CallError> {
        match self {
            FmuInstance::CoSimulation(inst) => {
                inst.do_step(current_time, step_size, true).map_err(call_err)?;
                Ok(())
            }
            FmuInstance::ModelExchange(me) => me.step(current_time, step_size),
        }
    }

    fn terminate(&mut self) -> Result<(), CallError> {
        match self {
            FmuInstance::CoSimulation(inst) => Common::terminate(inst).map_err(call_err)?,
            FmuInstance::ModelExchange(me) => Common::terminate(&mut me.inst).map_err(call_err)?,
        };
        Ok(())
    }
}

/// Fixed-step forward-Euler integration of a model-exchange instance.
pub struct MeDriver {
    inst: InstanceME,
    states: Vec<f64>,
    derivatives: Vec<f64>,
}

impl MeDriver {
    /// Leave the event mode entered by initialization and capture the
    /// initial continuous states.
    fn begin_continuous_time(&mut self) -> Result<(), CallError> {
        self.event_iteration()?;
        self.inst.enter_continuous_time_mode().map_err(call_err)?;
        if !self.states.is_empty() {
            self.inst
                .get_continuous_states(&mut self.states)
                .map_err(call_err)?;
        }
        Ok(())
    }

    fn step(&mut self, current_time: f64, step_size: f64) -> Result<(), CallError> {
        let next_time = current_time + step_size;

        if !self.states.is_empty() {
            self.inst
                .get_continuous_states(&mut self.states)
                .map_err(call_err)?;
            self.inst
                .get_derivatives(&mut self.derivatives)
                .map_err(call_err)?;
            for (x, dx) in self.states.iter_mut().zip(&self.derivatives) {
                *x += dx * step_size;
            }
        }

        self.inst.set_time(next_time).map_err(call_err)?;
        if !self.states.is_empty() {
            self.inst
                .set_continuous_states(&self.states)
                .map_err(call_err)?;
        }

        let mut enter_event_mode = false;
        let mut terminate_simulation = false;
        self.inst
            .completed_integrator_step(true, &mut enter_event_mode, &mut terminate_simulation)
            .map_err(call_err)?;
        if terminate_simulation {
            return Err(CallError::new("the model requested termination"));
        }
        if enter_event_mode {
            self.inst.enter_event_mode().map_err(call_err)?;
            let flags = self.event_iteration()?;
            if flags.values_of_continuous_states_changed && !self.states.is_empty() {
                self.inst
                    .get_continuous_states(&mut self.states)
                    .map_err(call_err)?;
            }
            self.inst.enter_continuous_time_mode().map_err(call_err)?;
        }
        Ok(())
    }

    fn event_iteration(&mut self) -> Result<EventFlags, CallError> {
        let mut flags = EventFlags::default();
        loop {
            flags.reset();
            self.inst.new_discrete_states(&mut flags).map_err(call_err)?;
            if flags.terminate_simulation {
                return Err(CallError::new(
                    "the model requested termination during event handling",
                ));
            }
            if !flags.discrete_states_need_update {
                return Ok(flags);
            }
        }
    }
}

fn initialize<I: Common>(inst: &mut I, start_time: f64, stop_time: f64) -> Result<(), Error> {
    inst.setup_experiment(None, start_time, Some(stop_time))
        .map_err(init_err)?;
    Common::enter_initialization_mode(inst).map_err(init_err)?;
    Common::exit_initialization_mode(inst).map_err(init_err)?;
    Ok(())
}

fn describe(md: &schema::Fmi2ModelDescription) -> ModelDescription {
    ModelDescription {
        model_name: md.model_name.clone(),
        variables: md
            .model_variables
            .variables
            .iter()
            .map(|sv| VariableDescriptor {
                name: sv.name.clone(),
                value_reference: sv.value_reference,
                causality: causality(&sv.causality),
            })
            .collect(),
        supports_co_simulation: md.co_simulation.is_some(),
        supports_model_exchange: md.model_exchange.is_some(),
    }
}

fn causality(c: &schema::Causality) -> Causality {
    match c {
        schema::Causality::Parameter => Causality::Parameter,
        schema::Causality::CalculatedParameter => Causality::CalculatedParameter,
        schema::Causality::Input => Causality::Input,
        schema::Causality::Output => Causality::Output,
        schema::Causality::Local => Causality::Local,
        schema::Causality::Independent => Causality::Independent,
    }
}

fn init_err(e: impl std::fmt::Display) -> Error {
    Error::ModelInit(e.to_string())
}

fn call_err(e: impl std::fmt::Display) -> CallError {
    CallError::new(e.to_string())
}
