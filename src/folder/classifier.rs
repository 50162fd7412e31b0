use serde::{Serialize, Serializer};

use super::environment::EnvironmentKeyword;
use super::FolderPath;
use crate::error::InventoryError;

const TOKEN_DELIMITER: char = '_';

/// Placeholder an inventory source reports instead of a path.
const NOT_AVAILABLE: &str = "N/A";
const ERROR_PREFIX: &str = "error:";

/// Which segment the no-underscore fallback of a multi-segment path uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackScope {
    /// The topmost folder, even when it is only a datacenter label.
    #[default]
    Outermost,
    /// The folder directly below the topmost one.
    SkipRoot,
}

impl FallbackScope {
    pub fn from_str(s: &str) -> Result<Self, InventoryError> {
        match s {
            "outermost" => Ok(FallbackScope::Outermost),
            "skip-root" => Ok(FallbackScope::SkipRoot),
            other => Err(InventoryError::InvalidFallback(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackScope::Outermost => "outermost",
            FallbackScope::SkipRoot => "skip-root",
        }
    }
}

/// Prefix and environment derived from a folder path.
///
/// Both parts may be empty; the pair is never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ClassificationResult {
    folder_prefix: String,
    #[serde(serialize_with = "serialize_environment")]
    environment: Option<EnvironmentKeyword>,
}

impl ClassificationResult {
    fn new(folder_prefix: &str, environment: Option<EnvironmentKeyword>) -> Self {
        Self {
            folder_prefix: folder_prefix.to_string(),
            environment,
        }
    }

    pub fn folder_prefix(&self) -> &str {
        &self.folder_prefix
    }

    /// Environment keyword, or `""` when none matched.
    pub fn environment(&self) -> &str {
        self.environment.map(|k| k.as_str()).unwrap_or("")
    }

    pub fn is_uncategorized(&self) -> bool {
        self.folder_prefix.is_empty() && self.environment.is_none()
    }
}

fn serialize_environment<S: Serializer>(
    env: &Option<EnvironmentKeyword>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(env.map(|k| k.as_str()).unwrap_or(""))
}

#[derive(Debug, thiserror::Error)]
enum ClassificationFailure {
    #[error("folder path is empty")]
    Empty,

    #[error("folder path is a lookup placeholder: {0}")]
    Sentinel(String),

    #[error("folder path is not valid UTF-8")]
    InvalidEncoding(#[from] std::str::Utf8Error),
}

/// Classifies a folder path. Never fails: unusable input yields an empty result.
pub fn classify(path: &FolderPath, scope: FallbackScope) -> ClassificationResult {
    absorb(try_classify(path, scope))
}

pub fn classify_str(path: &str, scope: FallbackScope) -> ClassificationResult {
    if is_sentinel(path) {
        return absorb(Err(ClassificationFailure::Sentinel(path.trim().to_string())));
    }
    classify(&FolderPath::parse(path), scope)
}

pub fn classify_bytes(path: &[u8], scope: FallbackScope) -> ClassificationResult {
    match std::str::from_utf8(path) {
        Ok(s) => classify_str(s, scope),
        Err(e) => absorb(Err(e.into())),
    }
}

fn absorb(result: Result<ClassificationResult, ClassificationFailure>) -> ClassificationResult {
    result.unwrap_or_else(|e| {
        tracing::debug!("uncategorized folder: {e}");
        ClassificationResult::default()
    })
}

fn try_classify(
    path: &FolderPath,
    scope: FallbackScope,
) -> Result<ClassificationResult, ClassificationFailure> {
    let segments = path.segments();

    let [first, rest @ ..] = segments else {
        return Err(ClassificationFailure::Empty);
    };

    if rest.is_empty() {
        if is_sentinel(first) {
            return Err(ClassificationFailure::Sentinel(first.clone()));
        }
        return Ok(classify_segment(first));
    }

    // Innermost delimited segment carries the naming convention
    if let Some(segment) = segments.iter().rev().find(|s| s.contains(TOKEN_DELIMITER)) {
        return Ok(classify_segment(segment));
    }

    let fallback = match scope {
        FallbackScope::Outermost => first,
        FallbackScope::SkipRoot => &rest[0],
    };
    Ok(classify_segment(fallback))
}

fn classify_segment(segment: &str) -> ClassificationResult {
    match segment.split_once(TOKEN_DELIMITER) {
        Some((prefix, remainder)) => {
            let environment = remainder
                .split(TOKEN_DELIMITER)
                .find_map(EnvironmentKeyword::from_token);
            ClassificationResult::new(prefix, environment)
        }
        None => ClassificationResult::new(segment, EnvironmentKeyword::find_in(segment)),
    }
}

fn is_sentinel(path: &str) -> bool {
    let trimmed = path.trim();
    trimmed == NOT_AVAILABLE
        || trimmed
            .get(..ERROR_PREFIX.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(ERROR_PREFIX))
}
