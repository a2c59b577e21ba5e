//! Model description types and the model-backend seam.
//!
//! A loaded model exposes its declared variable table and the simulation
//! interfaces it ships. Interface selection is an explicit capability check
//! with three outcomes (co-simulation, model-exchange, unsupported) rather
//! than a constructor-failure fallback chain.

use std::path::Path;

use crate::{sim::SimInstance, Error};

/// A variable's declared role in the model interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Causality {
    Parameter,
    CalculatedParameter,
    Input,
    Output,
    Local,
    Independent,
    Unknown,
}

/// One entry of the model's declared variable table. Names are unique
/// within a model.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDescriptor {
    pub name: String,
    /// Opaque handle the runtime uses for get/set on this variable.
    pub value_reference: u32,
    pub causality: Causality,
}

/// Which simulation interface to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    CoSimulation,
    ModelExchange,
}

impl std::fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterfaceKind::CoSimulation => f.write_str("co-simulation"),
            InterfaceKind::ModelExchange => f.write_str("model-exchange"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelDescription {
    pub model_name: String,
    /// Variables in model-declaration order.
    pub variables: Vec<VariableDescriptor>,
    pub supports_co_simulation: bool,
    pub supports_model_exchange: bool,
}

impl ModelDescription {
    /// Pick the interface to drive. Co-simulation wins when both are
    /// declared; a model declaring neither cannot be run at all.
    pub fn select_interface(&self) -> Result<InterfaceKind, Error> {
        if self.supports_co_simulation {
            Ok(InterfaceKind::CoSimulation)
        } else if self.supports_model_exchange {
            Ok(InterfaceKind::ModelExchange)
        } else {
            Err(Error::UnsupportedInterface)
        }
    }

    /// All output variables, preserving declaration order. This fixes the
    /// trailing columns of every result row for the whole run.
    pub fn outputs(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.variables
            .iter()
            .filter(|v| v.causality == Causality::Output)
    }
}

/// Loads a model archive from disk and reads its description.
pub trait ModelBackend {
    type Model: LoadedModel;

    fn load(&self, path: &Path) -> Result<Self::Model, Error>;
}

/// An extracted model, ready to instantiate. Instances borrow the loaded
/// archive and are initialized (up to and including exiting initialization
/// mode) before they are handed to the driver.
pub trait LoadedModel {
    type Instance<'a>: SimInstance
    where
        Self: 'a;

    fn description(&self) -> &ModelDescription;

    fn instantiate(
        &self,
        interface: InterfaceKind,
        start_time: f64,
        stop_time: f64,
    ) -> Result<Self::Instance<'_>, Error>;
}
