use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::{FleetConfig, VcenterEntry};
use crate::error::InventoryError;
use crate::folder::FallbackScope;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FleetFile {
    snapshot_dir: Option<PathBuf>,
    fallback: Option<String>,
    #[serde(default, rename = "vcenter")]
    vcenters: Vec<VcenterFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VcenterFile {
    name: String,
    host: String,
    credential_ref: String,
    snapshot: Option<PathBuf>,
}

/// Returns the first candidate config path that exists.
pub fn find_config(explicit: Option<&Path>, cwd: &Path) -> Result<PathBuf, InventoryError> {
    let candidates = FleetConfig::candidate_paths(explicit, cwd);
    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        return Ok(found.clone());
    }
    Err(InventoryError::ConfigNotFound(candidates))
}

pub fn load_fleet_config(path: &Path) -> Result<FleetConfig, InventoryError> {
    tracing::info!("loading fleet config from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let file: FleetFile = toml::from_str(&content).map_err(|e| InventoryError::InvalidConfig {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    resolve(file, path, base)
}

fn resolve(file: FleetFile, source: &Path, base: &Path) -> Result<FleetConfig, InventoryError> {
    let invalid = |message: String| InventoryError::InvalidConfig {
        path: source.to_path_buf(),
        message,
    };

    if file.vcenters.is_empty() {
        return Err(InventoryError::NoVcenters);
    }

    let fallback = match file.fallback.as_deref() {
        Some(s) => FallbackScope::from_str(s)?,
        None => FallbackScope::default(),
    };

    let snapshot_dir = match file.snapshot_dir {
        Some(dir) => base.join(dir),
        None => base.to_path_buf(),
    };

    let mut seen = HashSet::new();
    let mut vcenters = Vec::with_capacity(file.vcenters.len());
    for vc in file.vcenters {
        let name = vc.name.trim().to_string();
        if name.is_empty() {
            return Err(invalid("vCenter name must not be blank".to_string()));
        }
        if vc.host.trim().is_empty() {
            return Err(invalid(format!("vCenter '{name}' has a blank host")));
        }
        if vc.credential_ref.trim().is_empty() {
            return Err(invalid(format!("vCenter '{name}' has a blank credential_ref")));
        }
        if !seen.insert(name.clone()) {
            return Err(InventoryError::DuplicateVcenter(name));
        }

        let snapshot = match vc.snapshot {
            Some(p) => base.join(p),
            None => snapshot_dir.join(format!("{name}.json")),
        };

        vcenters.push(VcenterEntry {
            name,
            host: vc.host.trim().to_string(),
            credential_ref: vc.credential_ref,
            snapshot,
        });
    }

    Ok(FleetConfig {
        source: source.to_path_buf(),
        vcenters,
        fallback,
    })
}
