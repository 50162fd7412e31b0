pub mod snapshot;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::folder::FolderPath;

/// vSphere `VirtualMachinePowerState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
}

impl PowerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::PoweredOn => "poweredOn",
            PowerState::PoweredOff => "poweredOff",
            PowerState::Suspended => "suspended",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// vSphere `connectionState` as reported for a managed endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
    NotResponding,
}

impl ConnectionState {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::NotResponding => "notResponding",
        }
    }
}

/// Handle to a VM inside one inventory source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VmRecord {
    pub name: String,
    pub power_state: Option<PowerState>,
    pub folder_path: FolderPath,
}

/// A vCenter inventory: live API client or an exported snapshot.
pub trait InventorySource {
    fn vcenter(&self) -> &str;

    fn connection_state(&self) -> ConnectionState;

    fn list_vms(&self) -> Vec<VmRef>;

    /// Folder path of `vm`, excluding the root `vm` folder and the Datacenter.
    /// Empty when the VM sits in the root folder or the lookup fails.
    fn get_folder_path(&self, vm: &VmRef) -> FolderPath;

    fn power_state(&self, vm: &VmRef) -> Option<PowerState>;

    fn records(&self) -> Vec<VmRecord> {
        self.list_vms()
            .iter()
            .map(|vm| VmRecord {
                name: vm.name.clone(),
                power_state: self.power_state(vm),
                folder_path: self.get_folder_path(vm),
            })
            .collect()
    }
}
