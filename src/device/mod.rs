//! Minimal device tree of local variables.
//!
//! A [`Device`] is a named container of [`LocalVariable`]s, each with an access
//! mode. Remote-style access (`set`) honours the mode; the owning application uses
//! [`Device::update`] to refresh read-only values it computes itself.

mod smurf_application;

pub use smurf_application::SmurfApplication;

use serde::Serialize;

use crate::error::{HwError, HwResult};
use crate::hardware::AddressMap;
use crate::pv::{PvStore, PvValue};

/// Access mode of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessMode {
    /// `RO`: published but never changed by `set`.
    #[serde(rename = "RO")]
    ReadOnly,
    /// `RW`: writable through `set`.
    #[serde(rename = "RW")]
    ReadWrite,
}

/// A variable held by the device itself rather than by firmware.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalVariable {
    /// Unique name within the device.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    pub mode: AccessMode,
    /// Current value.
    pub value: PvValue,
}

impl LocalVariable {
    /// Variable with an explicit access mode.
    pub fn new(name: &str, description: &str, mode: AccessMode, value: impl Into<PvValue>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            mode,
            value: value.into(),
        }
    }

    /// Read-only variable.
    pub fn read_only(name: &str, description: &str, value: impl Into<PvValue>) -> Self {
        Self::new(name, description, AccessMode::ReadOnly, value)
    }

    /// Read-write variable.
    pub fn read_write(name: &str, description: &str, value: impl Into<PvValue>) -> Self {
        Self::new(name, description, AccessMode::ReadWrite, value)
    }
}

/// Named collection of variables, in registration order.
#[derive(Debug, Clone, Serialize)]
pub struct Device {
    name: String,
    description: String,
    variables: Vec<LocalVariable>,
}

impl Device {
    /// Empty device.
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            variables: Vec::new(),
        }
    }

    /// Device name, also its PV path segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Variables in registration order.
    pub fn variables(&self) -> &[LocalVariable] {
        &self.variables
    }

    /// Register a variable. Names are unique within a device.
    pub fn add(&mut self, variable: LocalVariable) -> HwResult<()> {
        if self.find(&variable.name).is_some() {
            return Err(HwError::DuplicateVariable {
                device: self.name.clone(),
                variable: variable.name,
            });
        }
        self.variables.push(variable);
        Ok(())
    }

    /// Current value of variable `name`.
    pub fn get(&self, name: &str) -> HwResult<&PvValue> {
        self.find(name)
            .map(|v| &v.value)
            .ok_or_else(|| self.unknown(name))
    }

    /// External write; refused for read-only variables.
    pub fn set(&mut self, name: &str, value: impl Into<PvValue>) -> HwResult<()> {
        let variable = self.find_mut(name)?;
        if variable.mode == AccessMode::ReadOnly {
            return Err(HwError::ReadOnly(variable.name.clone()));
        }
        variable.value = value.into();
        Ok(())
    }

    /// Internal write, ignoring the access mode.
    pub fn update(&mut self, name: &str, value: impl Into<PvValue>) -> HwResult<()> {
        self.find_mut(name)?.value = value.into();
        Ok(())
    }

    /// PV name a variable is served under.
    pub fn pv_name(&self, addresses: &AddressMap, variable: &str) -> String {
        addresses.device_variable(&self.name, variable)
    }

    /// Push every variable to `store` under its PV name.
    pub async fn publish(&self, store: &dyn PvStore, addresses: &AddressMap) -> HwResult<()> {
        for variable in &self.variables {
            let pv = self.pv_name(addresses, &variable.name);
            tracing::debug!(pv = %pv, value = %variable.value, "publishing device variable");
            store.write(&pv, variable.value.clone()).await?;
        }
        Ok(())
    }

    fn find(&self, name: &str) -> Option<&LocalVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    fn find_mut(&mut self, name: &str) -> HwResult<&mut LocalVariable> {
        let device = &self.name;
        self.variables
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| HwError::UnknownVariable {
                device: device.clone(),
                variable: name.to_string(),
            })
    }

    fn unknown(&self, name: &str) -> HwError {
        HwError::UnknownVariable {
            device: self.name.clone(),
            variable: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pv::MemoryPvStore;

    fn device() -> Device {
        let mut device = Device::new("Test", "Test device");
        device
            .add(LocalVariable::read_only("Version", "Version", "1.0"))
            .unwrap();
        device
            .add(LocalVariable::read_write("Gain", "Gain", 3_i64))
            .unwrap();
        device
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut device = device();
        let err = device
            .add(LocalVariable::read_write("Gain", "again", 0_i64))
            .unwrap_err();
        assert!(matches!(err, HwError::DuplicateVariable { .. }));
        assert_eq!(device.variables().len(), 2);
    }

    #[test]
    fn read_only_refuses_set_but_accepts_update() {
        let mut device = device();
        assert!(matches!(
            device.set("Version", "2.0"),
            Err(HwError::ReadOnly(name)) if name == "Version"
        ));
        device.update("Version", "2.0").unwrap();
        assert_eq!(device.get("Version").unwrap(), &PvValue::Text("2.0".into()));
    }

    #[test]
    fn read_write_set() {
        let mut device = device();
        device.set("Gain", 5_i64).unwrap();
        assert_eq!(device.get("Gain").unwrap(), &PvValue::Int(5));
    }

    #[test]
    fn unknown_variable() {
        let mut device = device();
        assert!(matches!(
            device.get("Nope"),
            Err(HwError::UnknownVariable { .. })
        ));
        assert!(device.set("Nope", 1_i64).is_err());
    }

    #[tokio::test]
    async fn publish_writes_in_order() {
        let device = device();
        let store = MemoryPvStore::new();
        device
            .publish(&store, &AddressMap::default())
            .await
            .unwrap();
        assert_eq!(
            store.writes().await,
            vec![
                ("dans_epics:AMCc:Test:Version".to_string(), PvValue::Text("1.0".into())),
                ("dans_epics:AMCc:Test:Gain".to_string(), PvValue::Int(3)),
            ]
        );
    }
}
