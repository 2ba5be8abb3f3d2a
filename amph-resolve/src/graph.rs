// amph-resolve/src/graph.rs
//! The dependency graph returned by the resolution engine. The graph is
//! immutable once returned; conflict-loser detection and path collection are
//! plain functions over it.

use std::path::{Path, PathBuf};

use amph_common::model::{ArtifactCoordinate, Dependency};

/// A node in a collected or resolved dependency graph.
///
/// `winner` is conflict metadata attached by the engine's conflict
/// resolution: when present and naming a different artifact identity, this
/// node lost the conflict and was retained for diagnostics only.
#[derive(Debug, Clone, Default)]
pub struct DependencyNode {
    pub dependency: Option<Dependency>,
    pub file: Option<PathBuf>,
    pub winner: Option<ArtifactCoordinate>,
    pub children: Vec<DependencyNode>,
}

impl DependencyNode {
    /// A synthetic root holding top-level dependencies.
    pub fn synthetic_root(children: Vec<DependencyNode>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    pub fn new(dependency: Dependency) -> Self {
        Self {
            dependency: Some(dependency),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_winner(mut self, winner: ArtifactCoordinate) -> Self {
        self.winner = Some(winner);
        self
    }

    pub fn with_children(mut self, children: Vec<DependencyNode>) -> Self {
        self.children = children;
        self
    }

    pub fn artifact(&self) -> Option<&ArtifactCoordinate> {
        self.dependency.as_ref().map(|d| &d.artifact)
    }

    /// A node lost conflict resolution iff its winner metadata names a
    /// different artifact identity. No metadata, or a winner matching the
    /// node itself, means the node stands.
    pub fn is_conflict_loser(&self) -> bool {
        match (&self.winner, self.artifact()) {
            (Some(winner), Some(artifact)) => !winner.same_id(artifact),
            _ => false,
        }
    }

    /// Pre-order walk over this node and its descendants.
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a DependencyNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

/// Collects the artifact files under `node` (itself included) in traversal
/// order, skipping conflict losers and nodes without a resolved file.
pub fn collect_paths(node: &DependencyNode) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    node.visit(&mut |n| {
        if !n.is_conflict_loser() {
            if let Some(file) = &n.file {
                paths.push(absolute_path(file));
            }
        }
    });
    paths
}

pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
