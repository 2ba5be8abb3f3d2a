use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::artifact::ArtifactCoordinate;

/// Dependency scope. Coordinates parsed from strings always get `Runtime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Compile,
    Provided,
    #[default]
    Runtime,
    Test,
    System,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Scope::Compile => "compile",
            Scope::Provided => "provided",
            Scope::Runtime => "runtime",
            Scope::Test => "test",
            Scope::System => "system",
        };
        f.write_str(s)
    }
}

/// Excludes a group/artifact pair from a dependency's transitive closure,
/// wildcard on kind and classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl Exclusion {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub artifact: ArtifactCoordinate,
    pub scope: Scope,
    pub optional: bool,
    pub exclusions: BTreeSet<Exclusion>,
}

impl Dependency {
    /// A plain runtime dependency with no exclusions.
    pub fn runtime(artifact: ArtifactCoordinate) -> Self {
        Self {
            artifact,
            scope: Scope::Runtime,
            optional: false,
            exclusions: BTreeSet::new(),
        }
    }

    pub fn with_exclusions(mut self, exclusions: BTreeSet<Exclusion>) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// The same dependency with its version folded to the base version.
    /// Snapshot coordinates resolve to timestamped artifacts; map keys must
    /// keep the declared identity.
    pub fn normalized(&self) -> Self {
        Self {
            artifact: self.artifact.with_base_version(),
            ..self.clone()
        }
    }
}

/// A managed-dependency override: pins the version (and kind/classifier) of a
/// dependency wherever it appears in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagedDependency {
    pub artifact: ArtifactCoordinate,
    pub optional: bool,
}
