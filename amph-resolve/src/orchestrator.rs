// amph-resolve/src/orchestrator.rs
//! The resolution orchestrator: turns coordinate strings into engine
//! requests and engine results into file paths.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use amph_common::config::{Config, LogLevel};
use amph_common::coords;
use amph_common::error::{AmphError, Result};
use amph_common::model::{ArtifactCoordinate, Dependency};
use amph_common::repo::{self, RemoteRepoSpec};
use amph_common::ManagedDependency;
use tracing::debug;

use crate::engine::{
    CollectRequest, DependencyRequest, DependencyResult, FileProcessor, LocalRepository,
    RepositoryEngine, SyncContextFactory, VersionRangeRequest, VersionRequest,
};
use crate::graph::{self, DependencyNode};
use crate::session::{PropertyOverrideSession, SessionBuilder, SessionView};
use crate::settings::Settings;
use crate::tree::TreePrinter;
use crate::LOG_TARGET;

/// Used when the caller configures no repositories at all.
pub const DEFAULT_REPOSITORIES: &[&str] = &["central"];

pub struct Resolver {
    config: Config,
    engine: Arc<dyn RepositoryEngine>,
    local: LocalRepository,
    settings: Arc<Settings>,
    sync_context_factory: Option<Arc<dyn SyncContextFactory>>,
    file_processor: Option<Arc<dyn FileProcessor>>,
    repositories: Vec<RemoteRepoSpec>,
    managed: Vec<ManagedDependency>,
    session: Mutex<Option<Arc<dyn SessionView>>>,
}

impl Resolver {
    pub fn new(engine: Arc<dyn RepositoryEngine>, config: Config) -> Self {
        let local = LocalRepository::new(config.local_repo_root.clone());
        debug!(
            target: LOG_TARGET,
            offline = config.offline,
            local_repo = %local.root().display(),
            "resolver created"
        );
        Self {
            config,
            engine,
            local,
            settings: Arc::new(Settings::new()),
            sync_context_factory: None,
            file_processor: None,
            repositories: Vec::new(),
            managed: Vec::new(),
            session: Mutex::new(None),
        }
    }

    pub fn with_settings(mut self, settings: Arc<Settings>) -> Self {
        self.settings = settings;
        self
    }

    /// Wires the collaborator's locking implementation into the session, so
    /// concurrent resolutions sharing this local repository stay safe. The
    /// locking itself lives with the collaborator.
    pub fn with_sync_context_factory(mut self, factory: Arc<dyn SyncContextFactory>) -> Self {
        self.sync_context_factory = Some(factory);
        self
    }

    pub fn with_file_processor(mut self, processor: Arc<dyn FileProcessor>) -> Self {
        self.file_processor = Some(processor);
        self
    }

    /// Parses and configures the repository list. An empty list selects the
    /// defaults. Repositories are deduplicated by equality, first occurrence
    /// wins.
    pub fn set_repositories(&mut self, specs: &[String], allow_snapshots: bool) -> Result<&mut Self> {
        let defaults: Vec<String>;
        let specs: &[String] = if specs.is_empty() {
            defaults = DEFAULT_REPOSITORIES.iter().map(|s| s.to_string()).collect();
            &defaults
        } else {
            specs
        };

        let session = self.session()?;
        let mut configured: Vec<RemoteRepoSpec> = Vec::new();
        for spec in specs {
            let mut repository = repo::configure_repository(
                spec,
                allow_snapshots,
                self.config.force_refresh,
                self.local.root(),
            )?;
            if let Some(proxy) = session.proxy_selector().select(&repository) {
                if self.config.log_level.is_logging(LogLevel::Debug) {
                    debug!(
                        target: LOG_TARGET,
                        repository = %repository.id,
                        host = %proxy.host,
                        "setting proxy for dependency repo"
                    );
                }
                repository = repository.with_proxy(proxy);
            }
            if let Some(auth) = session.authentication_selector().select(&repository) {
                if self.config.log_level.is_logging(LogLevel::Debug) {
                    debug!(
                        target: LOG_TARGET,
                        repository = %repository.id,
                        "setting authentication for dependency repo"
                    );
                }
                repository = repository.with_auth(auth);
            }
            if !configured.contains(&repository) {
                configured.push(repository);
            }
        }

        if self.repositories != configured {
            self.repositories = configured;
            if self.config.log_level.is_logging(LogLevel::Verbose) {
                debug!(target: LOG_TARGET, repositories = ?self.repositories, "resolver repositories");
            }
        }
        Ok(self)
    }

    pub fn set_managed_dependencies(&mut self, specs: &[String]) -> Result<&mut Self> {
        self.managed = coords::parse_managed_dependencies(specs)?;
        Ok(self)
    }

    /// Replaces the session's system-property view for all subsequent
    /// requests issued through this resolver.
    pub fn set_system_properties(&self, properties: HashMap<String, String>) -> Result<()> {
        let current = self.session()?;
        let mut guard = self.session.lock().unwrap();
        *guard = Some(Arc::new(PropertyOverrideSession::new(current, properties)));
        Ok(())
    }

    /// Resolves each coordinate as a direct dependency and returns the
    /// resolved artifact paths, conflict losers excluded.
    pub fn resolve_dependencies(&self, coords_list: &[String], kind: &str) -> Result<Vec<PathBuf>> {
        let dependencies = coords::parse_dependencies(coords_list, kind)?;
        self.resolve(self.collect_request().with_dependencies(dependencies))
    }

    /// Resolves a single coordinate as the root of a dependency tree,
    /// pulling in its own transitive dependencies.
    pub fn resolve_dependency(&self, coords_str: &str, kind: &str) -> Result<Vec<PathBuf>> {
        let root = coords::parse_dependency(coords_str, kind)?;
        self.resolve(self.collect_request().with_root(root))
    }

    /// Resolves already-parsed dependencies and groups the artifact paths
    /// under each first-level dependency. Keys are normalized to the base
    /// version so timestamped snapshot artifacts keep their declared
    /// identity.
    pub fn resolve_dependency_map(
        &self,
        dependencies: &[Dependency],
    ) -> Result<HashMap<Dependency, Vec<PathBuf>>> {
        let result = self.resolve0(
            self.collect_request()
                .with_dependencies(dependencies.to_vec()),
        )?;

        let mut resolved = HashMap::new();
        for child in &result.root.children {
            let Some(dependency) = &child.dependency else {
                continue;
            };
            resolved.insert(dependency.normalized(), graph::collect_paths(child));
        }
        Ok(resolved)
    }

    /// Writes the collected (not downloaded) dependency tree of the given
    /// coordinates to `out`.
    pub fn print_dependency_tree(
        &self,
        coords_list: &[String],
        kind: &str,
        out: &mut dyn Write,
    ) -> Result<()> {
        let dependencies = coords::parse_dependencies(coords_list, kind)?;
        self.print_tree(self.collect_request().with_dependencies(dependencies), out)
    }

    /// Like [`print_dependency_tree`](Self::print_dependency_tree) with the
    /// single coordinate as the tree root.
    pub fn print_root_dependency_tree(
        &self,
        coords_str: &str,
        kind: &str,
        out: &mut dyn Write,
    ) -> Result<()> {
        let root = coords::parse_dependency(coords_str, kind)?;
        self.print_tree(self.collect_request().with_root(root), out)
    }

    pub fn print_parsed_dependency_tree(
        &self,
        dependencies: &[Dependency],
        out: &mut dyn Write,
    ) -> Result<()> {
        self.print_tree(
            self.collect_request()
                .with_dependencies(dependencies.to_vec()),
            out,
        )
    }

    /// Resolves the newest available version of the coordinate: a range
    /// expression queries the matching versions and takes the highest, an
    /// exact (or absent) version is checked for existence. Returns the
    /// canonical coordinates carrying the resolved version.
    pub fn latest_version(&self, coords_str: &str, kind: &str) -> Result<String> {
        Ok(self.latest_artifact(coords_str, kind)?.to_string())
    }

    fn latest_artifact(&self, coords_str: &str, kind: &str) -> Result<ArtifactCoordinate> {
        let artifact = coords::parse_dependency(coords_str, kind)?.artifact;
        let session = self.session()?;

        let version = if artifact.is_version_range() {
            let request = VersionRangeRequest {
                artifact: artifact.clone(),
                repositories: self.repositories.clone(),
            };
            self.engine
                .resolve_version_range(session.as_ref(), &request)?
                .highest
        } else {
            let request = VersionRequest {
                artifact: artifact.clone(),
                repositories: self.repositories.clone(),
            };
            self.engine
                .resolve_version(session.as_ref(), &request)?
                .version
        };

        match version {
            Some(version) => Ok(artifact.with_version(version)),
            None => Err(AmphError::VersionNotFound(
                coords_str.to_string(),
                artifact.description(),
            )),
        }
    }

    fn collect_request(&self) -> CollectRequest {
        CollectRequest::new(self.managed.clone(), self.repositories.clone())
    }

    fn resolve(&self, collect: CollectRequest) -> Result<Vec<PathBuf>> {
        let result = self.resolve0(collect)?;
        Ok(result
            .artifacts
            .iter()
            .map(|a| graph::absolute_path(&a.file))
            .collect())
    }

    fn resolve0(&self, collect: CollectRequest) -> Result<DependencyResult> {
        if self.config.log_level.is_logging(LogLevel::Debug) {
            debug!(target: LOG_TARGET, request = ?collect, "resolve");
        }
        let request = DependencyRequest::new(collect)
            .with_filter(Arc::new(|node: &DependencyNode| !node.is_conflict_loser()));
        let session = self.session()?;
        match self.engine.resolve(session.as_ref(), &request) {
            Ok(result) => {
                if self.config.log_level.is_logging(LogLevel::Debug) {
                    debug!(target: LOG_TARGET, artifacts = result.artifacts.len(), "resolved");
                }
                Ok(result)
            }
            Err(e) => Err(AmphError::Resolution(e.to_string())),
        }
    }

    fn print_tree(&self, collect: CollectRequest, out: &mut dyn Write) -> Result<()> {
        let session = self.session()?;
        let root = self.engine.collect(session.as_ref(), &collect)?;
        TreePrinter::new(out).print(&root)
    }

    /// Builds the session on first use; repeated calls return the same
    /// session until [`set_system_properties`](Self::set_system_properties)
    /// swaps the view.
    fn session(&self) -> Result<Arc<dyn SessionView>> {
        let mut guard = self.session.lock().unwrap();
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }
        let mut builder = SessionBuilder::new(self.config.clone()).settings(self.settings.clone());
        if let Some(factory) = &self.sync_context_factory {
            builder = builder.sync_context_factory(factory.clone());
        }
        if let Some(processor) = &self.file_processor {
            builder = builder.file_processor(processor.clone());
        }
        let session: Arc<dyn SessionView> =
            Arc::new(builder.build(self.engine.as_ref(), &self.local)?);
        *guard = Some(session.clone());
        Ok(session)
    }
}
