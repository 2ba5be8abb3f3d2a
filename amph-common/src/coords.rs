// amph-common/src/coords.rs
//! Grammars for dependency coordinates, managed dependencies and exclusion
//! lists.
//!
//! Dependency coordinates: `groupId:artifactId[:version][:classifier]` with
//! an optional trailing parenthesized exclusion list. Every field excludes
//! `:` and `(`, except that a version may open with a single `(` or `[`
//! (range syntax). Managed dependencies: exactly five colon-delimited fields
//! `groupId:artifactId:type:classifier:version`. The whole input must be
//! consumed; anything else is a format error naming the input.

use std::collections::BTreeSet;

use crate::error::{AmphError, Result};
use crate::model::{ArtifactCoordinate, Dependency, Exclusion, ManagedDependency};

/// Parses a dependency coordinate string; `kind` is the artifact type the
/// caller resolves (usually `jar`). Default scope is runtime.
pub fn parse_dependency(coords: &str, kind: &str) -> Result<Dependency> {
    let raw = parse_coordinate(coords)?;
    let artifact = ArtifactCoordinate::new(
        raw.group_id,
        raw.artifact_id,
        raw.version,
        raw.classifier,
        empty_to_none(kind),
    );
    Ok(Dependency::runtime(artifact).with_exclusions(raw.exclusions))
}

pub fn parse_dependencies(coords: &[String], kind: &str) -> Result<Vec<Dependency>> {
    coords.iter().map(|c| parse_dependency(c, kind)).collect()
}

/// Parses a managed-dependency string. The version field is mandatory; the
/// sentinel `-` yields a versionless, optional entry (present in the graph
/// but excluded from the version override).
pub fn parse_managed_dependency(spec: &str) -> Result<ManagedDependency> {
    let mut cur = Cursor::new(spec);
    let group_id = cur.take_field();
    let sep1 = cur.eat(':');
    let artifact_id = cur.take_field();
    let sep2 = cur.eat(':');
    let kind = cur.take_field().to_string();
    let sep3 = cur.eat(':');
    let classifier = cur.take_field().to_string();
    let sep4 = cur.eat(':');
    let version_raw = cur.take_version_field();

    if group_id.trim().is_empty()
        || artifact_id.trim().is_empty()
        || version_raw.is_empty()
        || !(sep1 && sep2 && sep3 && sep4)
        || !cur.is_empty()
    {
        return Err(AmphError::ManagedCoordinate(spec.to_string()));
    }

    let Some(version) = empty_to_none(version_raw) else {
        return Err(AmphError::MissingManagedVersion(spec.to_string()));
    };
    let (version, optional) = if version == "-" {
        (None, true)
    } else {
        (Some(version), false)
    };

    Ok(ManagedDependency {
        artifact: ArtifactCoordinate::new(
            group_id.trim(),
            artifact_id.trim(),
            version,
            empty_to_none(&classifier),
            empty_to_none(&kind),
        ),
        optional,
    })
}

pub fn parse_managed_dependencies(specs: &[String]) -> Result<Vec<ManagedDependency>> {
    specs.iter().map(|s| parse_managed_dependency(s)).collect()
}

/// Trims and maps blank strings to `None`.
pub fn empty_to_none(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

struct RawCoordinate {
    group_id: String,
    artifact_id: String,
    version: Option<String>,
    classifier: Option<String>,
    exclusions: BTreeSet<Exclusion>,
}

fn parse_coordinate(coords: &str) -> Result<RawCoordinate> {
    let err = || AmphError::Coordinate(coords.to_string());

    let mut cur = Cursor::new(coords);
    let group_id = cur.take_field();
    if group_id.trim().is_empty() || !cur.eat(':') {
        return Err(err());
    }
    let artifact_id = cur.take_field();
    if artifact_id.trim().is_empty() {
        return Err(err());
    }

    let mut version = None;
    let mut classifier = None;
    if cur.eat(':') {
        version = empty_to_none(cur.take_version_field());
        if cur.eat(':') {
            let c = cur.take_field();
            if c.trim().is_empty() {
                return Err(err());
            }
            classifier = Some(c.trim().to_string());
        }
    }

    let mut exclusions = BTreeSet::new();
    if cur.eat('(') {
        let content = cur.take_until_closing_paren().ok_or_else(err)?;
        exclusions = parse_exclusions(content, coords)?;
    }
    if !cur.is_empty() {
        return Err(err());
    }

    Ok(RawCoordinate {
        group_id: group_id.trim().to_string(),
        artifact_id: artifact_id.trim().to_string(),
        version,
        classifier,
        exclusions,
    })
}

/// Each entry splits on `:` into exactly two non-empty components.
fn parse_exclusions(content: &str, coords: &str) -> Result<BTreeSet<Exclusion>> {
    let mut exclusions = BTreeSet::new();
    if content.trim().is_empty() {
        return Ok(exclusions);
    }
    for entry in content.split(',') {
        let entry = entry.trim();
        let mut parts = entry.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(artifact), None) if !group.is_empty() && !artifact.is_empty() => {
                exclusions.insert(Exclusion::new(group, artifact));
            }
            _ => {
                return Err(AmphError::Exclusion(coords.to_string(), entry.to_string()));
            }
        }
    }
    Ok(exclusions)
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }

    fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    fn eat(&mut self, c: char) -> bool {
        if let Some(stripped) = self.rest.strip_prefix(c) {
            self.rest = stripped;
            true
        } else {
            false
        }
    }

    /// Consumes up to the next `:` or `(` (exclusive).
    fn take_field(&mut self) -> &'a str {
        let end = self
            .rest
            .find([':', '('])
            .unwrap_or(self.rest.len());
        let (field, rest) = self.rest.split_at(end);
        self.rest = rest;
        field
    }

    /// Like `take_field`, but a single leading `(` belongs to the field
    /// (version-range syntax such as `(1.0,2.0]`).
    fn take_version_field(&mut self) -> &'a str {
        let skip = usize::from(self.rest.starts_with('('));
        let end = self.rest[skip..]
            .find([':', '('])
            .map(|i| i + skip)
            .unwrap_or(self.rest.len());
        let (field, rest) = self.rest.split_at(end);
        self.rest = rest;
        field
    }

    /// Consumes up to a closing `)`; the content may not nest parentheses.
    /// Returns `None` when unterminated or nested.
    fn take_until_closing_paren(&mut self) -> Option<&'a str> {
        let end = self.rest.find(')')?;
        let content = &self.rest[..end];
        if content.contains('(') {
            return None;
        }
        self.rest = &self.rest[end + 1..];
        Some(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scope;

    #[test]
    fn plain_coordinate() {
        let dep = parse_dependency("com.acme:lib:1.0", "jar").unwrap();
        assert_eq!(dep.artifact.group_id, "com.acme");
        assert_eq!(dep.artifact.artifact_id, "lib");
        assert_eq!(dep.artifact.version.as_deref(), Some("1.0"));
        assert_eq!(dep.artifact.classifier, None);
        assert_eq!(dep.artifact.extension(), "jar");
        assert_eq!(dep.scope, Scope::Runtime);
        assert!(!dep.optional);
        assert!(dep.exclusions.is_empty());
    }

    #[test]
    fn coordinate_with_classifier() {
        let dep = parse_dependency("com.acme:lib:1.0:sources", "jar").unwrap();
        assert_eq!(dep.artifact.classifier.as_deref(), Some("sources"));
    }

    #[test]
    fn empty_version_means_unspecified() {
        let dep = parse_dependency("com.acme:lib::sources", "jar").unwrap();
        assert_eq!(dep.artifact.version, None);
        assert_eq!(dep.artifact.classifier.as_deref(), Some("sources"));

        let dep = parse_dependency("com.acme:lib", "jar").unwrap();
        assert_eq!(dep.artifact.version, None);
    }

    #[test]
    fn version_ranges_pass_through() {
        let dep = parse_dependency("com.acme:lib:[0,)", "jar").unwrap();
        assert_eq!(dep.artifact.version.as_deref(), Some("[0,)"));
        assert!(dep.artifact.is_version_range());

        let dep = parse_dependency("com.acme:lib:(1.0,2.0]", "jar").unwrap();
        assert_eq!(dep.artifact.version.as_deref(), Some("(1.0,2.0]"));
        assert!(dep.artifact.is_version_range());
    }

    #[test]
    fn single_exclusion() {
        let dep = parse_dependency("com.acme:lib:1.0(com.other:excluded)", "jar").unwrap();
        assert_eq!(dep.exclusions.len(), 1);
        assert!(dep
            .exclusions
            .contains(&Exclusion::new("com.other", "excluded")));
    }

    #[test]
    fn exclusions_without_version() {
        let dep = parse_dependency("com.acme:lib(com.other:a, com.other:b)", "jar").unwrap();
        assert_eq!(dep.artifact.version, None);
        assert_eq!(dep.exclusions.len(), 2);
    }

    #[test]
    fn empty_exclusion_group_is_fine() {
        let dep = parse_dependency("com.acme:lib:1.0()", "jar").unwrap();
        assert!(dep.exclusions.is_empty());
    }

    #[test]
    fn malformed_exclusion_names_the_entry() {
        let err = parse_dependency("com.acme:lib:1.0(justartifact)", "jar").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Illegal exclusion dependency coordinates: com.acme:lib:1.0(justartifact) \
             (in exclusion justartifact)"
        );

        assert!(parse_dependency("com.acme:lib:1.0(a:b:c)", "jar").is_err());
        assert!(parse_dependency("com.acme:lib:1.0(:b)", "jar").is_err());
    }

    #[test]
    fn malformed_coordinates_are_rejected() {
        for bad in [
            "",
            "justone",
            "group:",
            ":artifact",
            "g:a:1.0:",
            "g:a:1.0:c:extra",
            "g:a:1.0(x:y",
            "g:a:1.0(x:y)trailing",
        ] {
            let err = parse_dependency(bad, "jar").unwrap_err();
            assert_eq!(err.to_string(), format!("Could not parse dependency: {bad}"));
        }
    }

    #[test]
    fn round_trip_to_canonical_form() {
        let dep = parse_dependency("com.acme:lib:1.0", "jar").unwrap();
        assert_eq!(dep.artifact.to_string(), "com.acme:lib:1.0");

        let dep = parse_dependency("com.acme:lib:1.0:sources(com.other:x)", "jar").unwrap();
        assert_eq!(dep.artifact.to_string(), "com.acme:lib:1.0:sources");
    }

    #[test]
    fn managed_dependency_full() {
        let managed = parse_managed_dependency("com.acme:lib:jar:sources:2.1").unwrap();
        assert_eq!(managed.artifact.version.as_deref(), Some("2.1"));
        assert_eq!(managed.artifact.classifier.as_deref(), Some("sources"));
        assert_eq!(managed.artifact.extension(), "jar");
        assert!(!managed.optional);
    }

    #[test]
    fn managed_dependency_empty_kind_and_classifier() {
        let managed = parse_managed_dependency("com.acme:lib:::1.0").unwrap();
        assert_eq!(managed.artifact.kind, None);
        assert_eq!(managed.artifact.extension(), "jar");
        assert_eq!(managed.artifact.classifier, None);
    }

    #[test]
    fn managed_dependency_version_sentinel() {
        let managed = parse_managed_dependency("com.acme:lib:jar::-").unwrap();
        assert_eq!(managed.artifact.version, None);
        assert!(managed.optional);
    }

    #[test]
    fn managed_dependency_requires_version() {
        let err = parse_managed_dependency("com.acme:lib:jar::").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not parse dependency management: com.acme:lib:jar::"
        );

        // grammatically present but blank
        let err = parse_managed_dependency("com.acme:lib:jar:: ").unwrap_err();
        assert!(matches!(err, AmphError::MissingManagedVersion(_)));
    }

    #[test]
    fn managed_dependency_field_count_is_exact() {
        for bad in ["com.acme:lib:1.0", "com.acme:lib:jar:cls:1.0:extra", "a:b:c:d"] {
            let err = parse_managed_dependency(bad).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Could not parse dependency management: {bad}")
            );
        }
    }

    #[test]
    fn managed_dependency_range_version() {
        let managed = parse_managed_dependency("com.acme:lib:::[1.0,2.0)").unwrap();
        assert!(managed.artifact.is_version_range());
    }
}
