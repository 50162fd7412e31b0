mod classifier;
pub mod environment;

use std::fmt;

use serde::{Serialize, Serializer};

pub use classifier::{classify, classify_bytes, classify_str, ClassificationResult, FallbackScope};

const SEPARATOR: char = '/';

/// A VM's location in the inventory folder tree, outermost folder first.
///
/// The root `vm` folder and the Datacenter are never part of the path.
/// Segments are trimmed and empty segments are dropped, so `"/"` and `""`
/// both parse to the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FolderPath {
    segments: Vec<String>,
}

impl FolderPath {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(path: &str) -> Self {
        Self::from_segments(path.split(SEPARATOR))
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments = segments
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { segments }
    }

    /// Builds a path from names collected while walking up from the VM,
    /// innermost folder first.
    pub fn from_leaf_to_root<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = Self::from_segments(segments);
        path.segments.reverse();
        path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl From<&str> for FolderPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl Serialize for FolderPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
