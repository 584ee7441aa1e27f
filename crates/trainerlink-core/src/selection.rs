//! Role bindings chosen on the device page.

use std::collections::HashMap;

use log::{info, warn};

use crate::error::{ConnectionError, SelectionError};
use crate::transport::{Device, DeviceRole, SampleStream, SensorTransport};

/// At most one connected device per role.
#[derive(Debug, Clone, Default)]
pub struct DeviceSelection {
    bindings: HashMap<DeviceRole, Device>,
}

impl DeviceSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect `device` and bind it to its role, replacing any previous binding.
    ///
    /// On failure the role is left exactly as it was.
    pub fn bind(
        &mut self,
        device: &Device,
        transport: &dyn SensorTransport,
    ) -> Result<SampleStream, ConnectionError> {
        let stream = transport.connect(device).inspect_err(|e| {
            warn!("Binding {} as {} failed: {e}", device.name, device.role.label());
        })?;
        if let Some(prev) = self.bindings.insert(device.role, device.clone()) {
            info!("{} replaced {} as {}", device.name, prev.name, device.role.label());
        }
        Ok(stream)
    }

    pub fn unbind(&mut self, role: DeviceRole) -> Option<Device> {
        self.bindings.remove(&role)
    }

    pub fn binding(&self, role: DeviceRole) -> Option<&Device> {
        self.bindings.get(&role)
    }

    /// Bound devices in role order.
    pub fn bound(&self) -> impl Iterator<Item = &Device> {
        DeviceRole::ALL
            .into_iter()
            .filter_map(|role| self.bindings.get(&role))
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Training needs a trainer; every other role is optional.
    pub fn start_training(&self) -> Result<&Device, SelectionError> {
        self.binding(DeviceRole::Trainer)
            .ok_or(SelectionError::NoTrainer)
    }
}
