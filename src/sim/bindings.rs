//! Binding resolution: matching requested names against the model's
//! declared variable table.

use std::collections::HashMap;

use crate::{model::VariableDescriptor, Error};

/// A requested variable matched against the model: name, runtime handle,
/// and the value to apply every step.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value_reference: u32,
    pub value: f64,
}

/// Match a parsed JSON object against the variable table.
///
/// The result preserves the iteration order of `requested` (the JSON key
/// order). Requested names the model does not declare are dropped without
/// error; partial binding is not fatal. A matched value that is not a JSON
/// number is rejected, since it could never be applied to the model.
pub fn resolve_bindings(
    requested: &serde_json::Map<String, serde_json::Value>,
    variables: &[VariableDescriptor],
) -> Result<Vec<Binding>, Error> {
    let by_name: HashMap<&str, &VariableDescriptor> =
        variables.iter().map(|v| (v.name.as_str(), v)).collect();

    let mut bindings = Vec::new();
    for (name, value) in requested {
        let Some(descriptor) = by_name.get(name.as_str()) else {
            log::debug!("Requested variable '{name}' is not declared by the model, skipping");
            continue;
        };
        let value = value.as_f64().ok_or_else(|| {
            Error::InvalidConfig(format!("value for variable '{name}' is not a number"))
        })?;
        log::debug!(
            "Bound '{name}' (vr = {}) to {value}",
            descriptor.value_reference
        );
        bindings.push(Binding {
            name: name.clone(),
            value_reference: descriptor.value_reference,
            value,
        });
    }
    Ok(bindings)
}
