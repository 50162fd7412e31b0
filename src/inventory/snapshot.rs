use std::collections::{HashMap, HashSet};

use indicatif::ProgressBar;
use serde::Deserialize;
use tokio::task::JoinSet;

use super::{ConnectionState, InventorySource, PowerState, VmRef};
use crate::config::VcenterEntry;
use crate::error::InventoryError;
use crate::folder::FolderPath;

const ROOT_VM_FOLDER: &str = "vm";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum EntityKind {
    Folder,
    Datacenter,
    VirtualMachine,
    VirtualApp,
    ResourcePool,
    ComputeResource,
    Host,
}

#[derive(Debug, Deserialize)]
struct Entity {
    id: String,
    name: String,
    kind: EntityKind,
    parent: Option<String>,
    power_state: Option<PowerState>,
}

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    vcenter: String,
    connection_state: ConnectionState,
    #[serde(default)]
    entities: Vec<Entity>,
}

#[derive(Debug, thiserror::Error)]
enum HierarchyError {
    #[error("VM {0} is not in the snapshot")]
    UnknownVm(String),

    #[error("parent {0} is not in the snapshot")]
    UnknownParent(String),

    #[error("containment loop through {0}")]
    Cycle(String),

    #[error("unexpected {kind:?} {id} above a VM")]
    UnexpectedParent { id: String, kind: EntityKind },
}

/// Inventory source backed by an exported vCenter entity list.
#[derive(Debug)]
pub struct SnapshotSource {
    vcenter: String,
    connection_state: ConnectionState,
    entities: HashMap<String, Entity>,
    vms: Vec<VmRef>,
}

impl SnapshotSource {
    pub fn from_json(json: &str) -> Result<Self, InventoryError> {
        let file: SnapshotFile = serde_json::from_str(json)?;

        let vms = file
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::VirtualMachine)
            .map(|e| VmRef {
                id: e.id.clone(),
                name: e.name.clone(),
            })
            .collect();

        let mut entities = HashMap::with_capacity(file.entities.len());
        for entity in file.entities {
            if let Some(prev) = entities.insert(entity.id.clone(), entity) {
                tracing::warn!("{}: duplicate entity id {}, keeping last", file.vcenter, prev.id);
            }
        }

        Ok(Self {
            vcenter: file.vcenter,
            connection_state: file.connection_state,
            entities,
            vms,
        })
    }

    pub async fn load(entry: &VcenterEntry) -> Result<Self, InventoryError> {
        let load_err = |message: String| InventoryError::SnapshotLoad {
            vcenter: entry.name.clone(),
            path: entry.snapshot.clone(),
            message,
        };

        tracing::info!(
            "reading snapshot for {} (host {}, credential {}) from {}",
            entry.name,
            entry.host,
            entry.credential_ref,
            entry.snapshot.display()
        );
        let content = tokio::fs::read_to_string(&entry.snapshot)
            .await
            .map_err(|e| load_err(e.to_string()))?;
        let source = Self::from_json(&content).map_err(|e| load_err(e.to_string()))?;

        if source.vcenter != entry.name {
            return Err(InventoryError::SnapshotMismatch {
                path: entry.snapshot.clone(),
                expected: entry.name.clone(),
                found: source.vcenter,
            });
        }
        Ok(source)
    }

    fn is_datacenter(&self, id: Option<&str>) -> bool {
        id.and_then(|id| self.entities.get(id))
            .is_some_and(|e| e.kind == EntityKind::Datacenter)
    }

    /// Folder names from the VM's parent up to the root `vm` folder, innermost first.
    fn walk_folders(&self, vm_id: &str) -> Result<Vec<&str>, HierarchyError> {
        let vm = self
            .entities
            .get(vm_id)
            .ok_or_else(|| HierarchyError::UnknownVm(vm_id.to_string()))?;

        let mut names = Vec::new();
        let mut visited = HashSet::new();
        let mut current = vm.parent.as_deref();

        while let Some(id) = current {
            if !visited.insert(id) {
                return Err(HierarchyError::Cycle(id.to_string()));
            }
            let entity = self
                .entities
                .get(id)
                .ok_or_else(|| HierarchyError::UnknownParent(id.to_string()))?;

            match entity.kind {
                EntityKind::Datacenter => break,
                EntityKind::Folder
                    if entity.name == ROOT_VM_FOLDER
                        && self.is_datacenter(entity.parent.as_deref()) =>
                {
                    break
                }
                EntityKind::Folder | EntityKind::VirtualApp => names.push(entity.name.as_str()),
                kind => {
                    return Err(HierarchyError::UnexpectedParent {
                        id: id.to_string(),
                        kind,
                    })
                }
            }
            current = entity.parent.as_deref();
        }

        Ok(names)
    }
}

impl InventorySource for SnapshotSource {
    fn vcenter(&self) -> &str {
        &self.vcenter
    }

    fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    fn list_vms(&self) -> Vec<VmRef> {
        self.vms.clone()
    }

    fn get_folder_path(&self, vm: &VmRef) -> FolderPath {
        match self.walk_folders(&vm.id) {
            Ok(names) => FolderPath::from_leaf_to_root(names),
            Err(e) => {
                tracing::warn!("{}: cannot resolve folder of {}: {e}", self.vcenter, vm.name);
                FolderPath::empty()
            }
        }
    }

    fn power_state(&self, vm: &VmRef) -> Option<PowerState> {
        self.entities.get(&vm.id).and_then(|e| e.power_state)
    }
}

/// Outcome of loading one configured vCenter.
pub struct LoadedSnapshot {
    pub vcenter: String,
    pub result: Result<SnapshotSource, InventoryError>,
}

/// Loads every snapshot concurrently. Results come back in config order;
/// a failed snapshot is returned as an error entry, not propagated.
pub async fn load_snapshots(
    entries: &[VcenterEntry],
    progress: &ProgressBar,
) -> Result<Vec<LoadedSnapshot>, InventoryError> {
    let mut set = JoinSet::new();
    for (idx, entry) in entries.iter().cloned().enumerate() {
        set.spawn(async move {
            let result = SnapshotSource::load(&entry).await;
            (idx, entry.name, result)
        });
    }

    let mut loaded = Vec::with_capacity(entries.len());
    while let Some(joined) = set.join_next().await {
        let (idx, vcenter, result) = joined?;
        progress.set_message(vcenter.clone());
        progress.inc(1);
        loaded.push((idx, LoadedSnapshot { vcenter, result }));
    }

    loaded.sort_by_key(|(idx, _)| *idx);
    Ok(loaded.into_iter().map(|(_, l)| l).collect())
}
