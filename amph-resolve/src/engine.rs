// amph-resolve/src/engine.rs
//! The boundary to the external resolution engine: the component that builds
//! dependency graphs, runs conflict resolution and downloads artifacts. This
//! crate only assembles requests for it and consumes its results.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use amph_common::model::{ArtifactCoordinate, Dependency, ManagedDependency, ResolvedArtifact};
use amph_common::repo::RemoteRepoSpec;
use amph_common::Result;
use tracing::{debug, warn};

use crate::graph::DependencyNode;
use crate::session::SessionView;
use crate::LOG_TARGET;

/// The local artifact store the engine resolves into.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Engine-side view of the local repository layout. The layout itself is the
/// engine's business; this crate only asks where things are.
pub trait LocalRepositoryManager: Send + Sync {
    fn root(&self) -> &Path;
    fn artifact_path(&self, artifact: &ArtifactCoordinate) -> PathBuf;
}

/// Predicate the engine applies to graph nodes before downloading their
/// artifacts.
pub type DependencyFilter = Arc<dyn Fn(&DependencyNode) -> bool + Send + Sync>;

/// A request to build a dependency graph: either a single root dependency
/// (whose own transitive dependencies are pulled in) or a list of direct
/// dependencies under a synthetic root.
#[derive(Debug, Clone, Default)]
pub struct CollectRequest {
    pub root: Option<Dependency>,
    pub dependencies: Vec<Dependency>,
    pub managed: Vec<ManagedDependency>,
    pub repositories: Vec<RemoteRepoSpec>,
}

impl CollectRequest {
    pub fn new(managed: Vec<ManagedDependency>, repositories: Vec<RemoteRepoSpec>) -> Self {
        Self {
            root: None,
            dependencies: Vec::new(),
            managed,
            repositories,
        }
    }

    pub fn with_root(mut self, root: Dependency) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

/// A collect request plus the download filter.
#[derive(Clone)]
pub struct DependencyRequest {
    pub collect: CollectRequest,
    pub filter: Option<DependencyFilter>,
}

impl DependencyRequest {
    pub fn new(collect: CollectRequest) -> Self {
        Self {
            collect,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: DependencyFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl fmt::Debug for DependencyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyRequest")
            .field("collect", &self.collect)
            .field("filter", &self.filter.as_ref().map(|_| "<predicate>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DependencyResult {
    pub root: DependencyNode,
    pub artifacts: Vec<ResolvedArtifact>,
}

#[derive(Debug, Clone)]
pub struct VersionRangeRequest {
    pub artifact: ArtifactCoordinate,
    pub repositories: Vec<RemoteRepoSpec>,
}

/// Versions matching a range. `highest` is the maximum of `versions` under
/// the engine's version ordering; this layer never orders versions itself.
#[derive(Debug, Clone, Default)]
pub struct VersionRangeResult {
    pub versions: Vec<String>,
    pub highest: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VersionRequest {
    pub artifact: ArtifactCoordinate,
    pub repositories: Vec<RemoteRepoSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct VersionResult {
    pub version: Option<String>,
    pub repository: Option<String>,
}

/// The external resolution engine. All calls are synchronous and blocking;
/// any internal download concurrency is the engine's own.
pub trait RepositoryEngine: Send + Sync {
    fn local_repository_manager(
        &self,
        local: &LocalRepository,
    ) -> Result<Arc<dyn LocalRepositoryManager>>;

    /// Builds the dependency graph without downloading artifacts.
    fn collect(&self, session: &dyn SessionView, request: &CollectRequest)
        -> Result<DependencyNode>;

    /// Builds the graph and downloads the artifacts accepted by the filter.
    fn resolve(
        &self,
        session: &dyn SessionView,
        request: &DependencyRequest,
    ) -> Result<DependencyResult>;

    fn resolve_version_range(
        &self,
        session: &dyn SessionView,
        request: &VersionRangeRequest,
    ) -> Result<VersionRangeResult>;

    fn resolve_version(
        &self,
        session: &dyn SessionView,
        request: &VersionRequest,
    ) -> Result<VersionResult>;
}

/// Scoped lock over a set of artifacts in the shared local repository.
/// Implementations come from the engine side; this crate only wires them
/// into the session so concurrent resolutions do not corrupt on-disk state.
pub trait SyncContext: Send {
    fn acquire(&mut self, artifacts: &[ArtifactCoordinate]) -> Result<()>;
}

pub trait SyncContextFactory: Send + Sync {
    fn new_context(&self, shared: bool) -> Box<dyn SyncContext>;
}

/// File operations performed under the collaborator's locking discipline.
pub trait FileProcessor: Send + Sync {
    fn write(&self, target: &Path, data: &[u8]) -> Result<()>;
    fn move_file(&self, source: &Path, target: &Path) -> Result<()>;
}

/// Transfer progress callbacks, invoked by the engine while downloading.
pub trait TransferListener: Send + Sync {
    fn started(&self, resource: &str);
    fn succeeded(&self, resource: &str, bytes: u64);
    fn failed(&self, resource: &str, error: &str);
}

/// Repository events (artifact lookups) emitted by the engine.
pub trait RepositoryListener: Send + Sync {
    fn artifact_resolving(&self, artifact: &ArtifactCoordinate);
    fn artifact_resolved(&self, artifact: &ArtifactCoordinate, repository: Option<&str>);
}

/// Forwards transfer events to the tracing facade.
#[derive(Debug, Clone, Copy)]
pub struct TracingTransferListener {
    verbose: bool,
}

impl TracingTransferListener {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl TransferListener for TracingTransferListener {
    fn started(&self, resource: &str) {
        if self.verbose {
            debug!(target: LOG_TARGET, resource, "downloading");
        }
    }

    fn succeeded(&self, resource: &str, bytes: u64) {
        if self.verbose {
            debug!(target: LOG_TARGET, resource, bytes, "downloaded");
        }
    }

    fn failed(&self, resource: &str, error: &str) {
        warn!(target: LOG_TARGET, resource, error, "transfer failed");
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TracingRepositoryListener {
    verbose: bool,
}

impl TracingRepositoryListener {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl RepositoryListener for TracingRepositoryListener {
    fn artifact_resolving(&self, artifact: &ArtifactCoordinate) {
        if self.verbose {
            debug!(target: LOG_TARGET, artifact = %artifact, "resolving artifact");
        }
    }

    fn artifact_resolved(&self, artifact: &ArtifactCoordinate, repository: Option<&str>) {
        if self.verbose {
            debug!(target: LOG_TARGET, artifact = %artifact, repository, "resolved artifact");
        }
    }
}
