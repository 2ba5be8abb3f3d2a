// amph-common/src/model/artifact.rs
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Extension assumed when a coordinate does not carry one.
pub const DEFAULT_KIND: &str = "jar";

const SNAPSHOT: &str = "SNAPSHOT";

/// A parsed artifact coordinate. `version` is an exact version, a range
/// expression (`[0,)` style), or absent (resolve to latest on demand).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactCoordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub classifier: Option<String>,
    pub kind: Option<String>,
}

impl ArtifactCoordinate {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: Option<String>,
        classifier: Option<String>,
        kind: Option<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version,
            classifier,
            kind,
        }
    }

    /// The artifact type / file extension, defaulting to `jar`.
    pub fn extension(&self) -> &str {
        self.kind.as_deref().unwrap_or(DEFAULT_KIND)
    }

    /// Range expressions open with a bracket or parenthesis.
    pub fn is_version_range(&self) -> bool {
        self.version
            .as_deref()
            .is_some_and(|v| v.starts_with('(') || v.starts_with('['))
    }

    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            ..self.clone()
        }
    }

    /// The version with any snapshot timestamp folded back to `-SNAPSHOT`.
    /// Timestamped snapshots (`1.0-20140603.120110-2`) resolve from the same
    /// declared version, so identity must not depend on the timestamp.
    pub fn base_version(&self) -> Option<String> {
        self.version.as_deref().map(snapshot_base)
    }

    pub fn with_base_version(&self) -> Self {
        Self {
            version: self.base_version(),
            ..self.clone()
        }
    }

    /// Full identity comparison: group, artifact, classifier, extension and
    /// exact version. Used for conflict-winner checks.
    pub fn same_id(&self, other: &Self) -> bool {
        self.group_id == other.group_id
            && self.artifact_id == other.artifact_id
            && self.classifier == other.classifier
            && self.extension() == other.extension()
            && self.version == other.version
    }

    /// Verbose form naming every field, used in diagnostics.
    pub fn description(&self) -> String {
        let mut s = format!("{}:{}:{}", self.group_id, self.artifact_id, self.extension());
        if let Some(classifier) = &self.classifier {
            s.push(':');
            s.push_str(classifier);
        }
        s.push(':');
        s.push_str(self.version.as_deref().unwrap_or(""));
        s
    }
}

/// Canonical coordinate form: `group:artifact:version[:classifier]`, the
/// classifier omitted entirely when absent.
impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.group_id,
            self.artifact_id,
            self.version.as_deref().unwrap_or("")
        )?;
        match self.classifier.as_deref() {
            Some(classifier) if !classifier.is_empty() => write!(f, ":{classifier}"),
            _ => Ok(()),
        }
    }
}

/// An artifact the engine has resolved to a concrete file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    pub artifact: ArtifactCoordinate,
    pub file: PathBuf,
}

fn snapshot_base(version: &str) -> String {
    if let Some(prefix) = timestamped_snapshot_prefix(version) {
        return format!("{prefix}-{SNAPSHOT}");
    }
    version.to_string()
}

/// For `<base>-YYYYMMDD.HHMMSS-<build>` returns `<base>`.
fn timestamped_snapshot_prefix(version: &str) -> Option<&str> {
    let (rest, build) = version.rsplit_once('-')?;
    if build.is_empty() || !build.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (prefix, stamp) = rest.rsplit_once('-')?;
    let bytes = stamp.as_bytes();
    let timestamped = bytes.len() == 15
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[8] == b'.'
        && bytes[9..].iter().all(u8::is_ascii_digit);
    if timestamped && !prefix.is_empty() {
        Some(prefix)
    } else {
        None
    }
}
