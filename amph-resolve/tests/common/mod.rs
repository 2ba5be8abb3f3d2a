#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use amph_common::model::{ArtifactCoordinate, ResolvedArtifact};
use amph_common::{AmphError, Result};
use amph_resolve::engine::{
    CollectRequest, DependencyRequest, DependencyResult, LocalRepository, LocalRepositoryManager,
    RepositoryEngine, SyncContext, SyncContextFactory, VersionRangeRequest, VersionRangeResult,
    VersionRequest, VersionResult,
};
use amph_resolve::graph::DependencyNode;
use amph_resolve::session::SessionView;

pub struct FakeLocalRepositoryManager {
    root: PathBuf,
}

impl LocalRepositoryManager for FakeLocalRepositoryManager {
    fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_path(&self, artifact: &ArtifactCoordinate) -> PathBuf {
        let mut path = self.root.clone();
        for part in artifact.group_id.split('.') {
            path.push(part);
        }
        path.push(&artifact.artifact_id);
        if let Some(version) = &artifact.version {
            path.push(version);
        }
        path.push(format!(
            "{}-{}.{}",
            artifact.artifact_id,
            artifact.version.as_deref().unwrap_or("unversioned"),
            artifact.extension()
        ));
        path
    }
}

/// Engine double: returns canned graphs/versions and records every request
/// plus the session state it was invoked with.
#[derive(Default)]
pub struct FakeEngine {
    graph: Mutex<Option<DependencyNode>>,
    range_versions: Mutex<Vec<String>>,
    exact_version: Mutex<Option<String>>,
    resolution_failure: Mutex<Option<String>>,

    pub manager_calls: AtomicUsize,
    pub last_collect: Mutex<Option<CollectRequest>>,
    pub last_range: Mutex<Option<VersionRangeRequest>>,
    pub last_exact: Mutex<Option<VersionRequest>>,
    pub seen_system_properties: Mutex<Vec<HashMap<String, String>>>,
    pub saw_sync_context_factory: Mutex<bool>,
}

/// Stand-in for an engine-side locking implementation.
pub struct NoopSyncContextFactory;

struct NoopSyncContext;

impl SyncContext for NoopSyncContext {
    fn acquire(&mut self, _artifacts: &[ArtifactCoordinate]) -> Result<()> {
        Ok(())
    }
}

impl SyncContextFactory for NoopSyncContextFactory {
    fn new_context(&self, _shared: bool) -> Box<dyn SyncContext> {
        Box::new(NoopSyncContext)
    }
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_graph(&self, root: DependencyNode) {
        *self.graph.lock().unwrap() = Some(root);
    }

    pub fn set_range_versions(&self, versions: &[&str]) {
        *self.range_versions.lock().unwrap() = versions.iter().map(|v| v.to_string()).collect();
    }

    pub fn set_exact_version(&self, version: Option<&str>) {
        *self.exact_version.lock().unwrap() = version.map(String::from);
    }

    pub fn fail_resolution_with(&self, message: &str) {
        *self.resolution_failure.lock().unwrap() = Some(message.to_string());
    }

    fn record_session(&self, session: &dyn SessionView) {
        self.seen_system_properties
            .lock()
            .unwrap()
            .push(session.system_properties().clone());
        *self.saw_sync_context_factory.lock().unwrap() =
            session.sync_context_factory().is_some();
    }

    fn graph_or_fail(&self) -> Result<DependencyNode> {
        self.graph
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AmphError::Generic("fake engine has no graph".into()))
    }
}

impl RepositoryEngine for FakeEngine {
    fn local_repository_manager(
        &self,
        local: &LocalRepository,
    ) -> Result<Arc<dyn LocalRepositoryManager>> {
        self.manager_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeLocalRepositoryManager {
            root: local.root().to_path_buf(),
        }))
    }

    fn collect(
        &self,
        session: &dyn SessionView,
        request: &CollectRequest,
    ) -> Result<DependencyNode> {
        self.record_session(session);
        *self.last_collect.lock().unwrap() = Some(request.clone());
        self.graph_or_fail()
    }

    fn resolve(
        &self,
        session: &dyn SessionView,
        request: &DependencyRequest,
    ) -> Result<DependencyResult> {
        self.record_session(session);
        *self.last_collect.lock().unwrap() = Some(request.collect.clone());
        if let Some(message) = self.resolution_failure.lock().unwrap().clone() {
            return Err(AmphError::Generic(message));
        }

        let root = self.graph_or_fail()?;
        let mut artifacts = Vec::new();
        root.visit(&mut |node| {
            let accepted = request.filter.as_ref().map_or(true, |accept| accept(node));
            if accepted {
                if let (Some(dependency), Some(file)) = (&node.dependency, &node.file) {
                    artifacts.push(ResolvedArtifact {
                        artifact: dependency.artifact.clone(),
                        file: file.clone(),
                    });
                }
            }
        });
        Ok(DependencyResult { root, artifacts })
    }

    fn resolve_version_range(
        &self,
        session: &dyn SessionView,
        request: &VersionRangeRequest,
    ) -> Result<VersionRangeResult> {
        self.record_session(session);
        *self.last_range.lock().unwrap() = Some(request.clone());
        let versions = self.range_versions.lock().unwrap().clone();
        let highest = versions.last().cloned();
        Ok(VersionRangeResult { versions, highest })
    }

    fn resolve_version(
        &self,
        session: &dyn SessionView,
        request: &VersionRequest,
    ) -> Result<VersionResult> {
        self.record_session(session);
        *self.last_exact.lock().unwrap() = Some(request.clone());
        Ok(VersionResult {
            version: self.exact_version.lock().unwrap().clone(),
            repository: None,
        })
    }
}
