use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("no fleet config found (tried: {})", format_paths(.0))]
    ConfigNotFound(Vec<PathBuf>),

    #[error("invalid config {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("config lists no vCenters (add at least one [[vcenter]] table)")]
    NoVcenters,

    #[error("vCenter '{0}' is listed more than once")]
    DuplicateVcenter(String),

    #[error("invalid fallback scope: {0} (expected: outermost, skip-root)")]
    InvalidFallback(String),

    #[error("cannot load snapshot for {vcenter} from {path}: {message}")]
    SnapshotLoad {
        vcenter: String,
        path: PathBuf,
        message: String,
    },

    #[error("snapshot {path} belongs to vCenter '{found}', expected '{expected}'")]
    SnapshotMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("snapshot task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
