use std::path::{Path, PathBuf};

use crate::error::InventoryError;
use crate::folder::FallbackScope;

pub const CONFIG_FILE: &str = "vcinventory.toml";

/// One managed vCenter. `credential_ref` names where the secret lives, never the secret.
#[derive(Debug, Clone, PartialEq)]
pub struct VcenterEntry {
    pub name: String,
    pub host: String,
    pub credential_ref: String,
    pub snapshot: PathBuf,
}

/// Fleet settings loaded once at startup and passed down by reference.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    pub source: PathBuf,
    pub vcenters: Vec<VcenterEntry>,
    pub fallback: FallbackScope,
}

impl FleetConfig {
    pub fn user_config_dir() -> Result<PathBuf, InventoryError> {
        let base = dirs::config_dir().ok_or_else(|| {
            InventoryError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "cannot determine user config directory",
            ))
        })?;
        Ok(base.join("vcinventory"))
    }

    /// Paths searched for the config file, in order.
    pub fn candidate_paths(explicit: Option<&Path>, cwd: &Path) -> Vec<PathBuf> {
        if let Some(path) = explicit {
            return vec![path.to_path_buf()];
        }
        let mut paths = vec![cwd.join(CONFIG_FILE)];
        if let Ok(dir) = Self::user_config_dir() {
            paths.push(dir.join(CONFIG_FILE));
        }
        paths
    }

    pub fn vcenter(&self, name: &str) -> Option<&VcenterEntry> {
        self.vcenters.iter().find(|v| v.name == name)
    }
}
