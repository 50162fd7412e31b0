use std::fmt;

use serde::Serialize;

/// Deployment-stage keywords recognized in folder names.
///
/// Variant order is the matching order: when a folder name contains more than
/// one keyword as a substring, the earliest variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentKeyword {
    Dev,
    Qa,
    Prod,
    Test,
    Staging,
    Uat,
    Preprod,
    Production,
}

impl EnvironmentKeyword {
    pub const ALL: [EnvironmentKeyword; 8] = [
        EnvironmentKeyword::Dev,
        EnvironmentKeyword::Qa,
        EnvironmentKeyword::Prod,
        EnvironmentKeyword::Test,
        EnvironmentKeyword::Staging,
        EnvironmentKeyword::Uat,
        EnvironmentKeyword::Preprod,
        EnvironmentKeyword::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentKeyword::Dev => "dev",
            EnvironmentKeyword::Qa => "qa",
            EnvironmentKeyword::Prod => "prod",
            EnvironmentKeyword::Test => "test",
            EnvironmentKeyword::Staging => "staging",
            EnvironmentKeyword::Uat => "uat",
            EnvironmentKeyword::Preprod => "preprod",
            EnvironmentKeyword::Production => "production",
        }
    }

    /// Exact match against a single token, ignoring case.
    pub fn from_token(token: &str) -> Option<Self> {
        let lowered = token.to_lowercase();
        Self::ALL.into_iter().find(|k| k.as_str() == lowered)
    }

    /// First keyword (in matching order) contained anywhere in `name`, ignoring case.
    pub fn find_in(name: &str) -> Option<Self> {
        let lowered = name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| lowered.contains(k.as_str()))
    }
}

impl fmt::Display for EnvironmentKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
