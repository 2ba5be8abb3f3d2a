// amph-resolve/src/session.rs
//! Assembly of the resolution session: the cross-cutting configuration every
//! engine request runs under.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use amph_common::config::{Config, LogLevel, PROP_CONNECT_TIMEOUT, PROP_REQUEST_TIMEOUT};
use amph_common::repo::UpdatePolicy;
use amph_common::Result;
use tracing::debug;

use crate::engine::{
    FileProcessor, LocalRepository, LocalRepositoryManager, RepositoryEngine, RepositoryListener,
    SyncContextFactory, TracingRepositoryListener, TracingTransferListener, TransferListener,
};
use crate::settings::{AuthenticationSelector, EnvProxySelector, MirrorSelector, ProxySelector, Settings};
use crate::LOG_TARGET;

/// Read view of a resolution session, shared with the engine for every
/// request.
pub trait SessionView: Send + Sync {
    fn offline(&self) -> bool;
    fn update_policy(&self) -> UpdatePolicy;
    fn connect_timeout(&self) -> Option<Duration>;
    fn request_timeout(&self) -> Option<Duration>;
    /// Engine tuning knobs as raw key/value pairs.
    fn config_properties(&self) -> &HashMap<String, String>;
    /// The process-level property view (seeded from the environment).
    fn system_properties(&self) -> &HashMap<String, String>;
    fn local_repository_manager(&self) -> &Arc<dyn LocalRepositoryManager>;
    fn mirror_selector(&self) -> &Arc<dyn MirrorSelector>;
    fn proxy_selector(&self) -> &Arc<dyn ProxySelector>;
    fn authentication_selector(&self) -> &Arc<dyn AuthenticationSelector>;
    fn transfer_listener(&self) -> Option<&Arc<dyn TransferListener>>;
    fn repository_listener(&self) -> Option<&Arc<dyn RepositoryListener>>;
    fn sync_context_factory(&self) -> Option<&Arc<dyn SyncContextFactory>>;
    fn file_processor(&self) -> Option<&Arc<dyn FileProcessor>>;
}

/// The concrete session. Immutable once built; the orchestrator swaps in a
/// [`PropertyOverrideSession`] when the system-property view changes.
pub struct Session {
    offline: bool,
    update_policy: UpdatePolicy,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    config_properties: HashMap<String, String>,
    system_properties: HashMap<String, String>,
    local_repo_manager: Arc<dyn LocalRepositoryManager>,
    mirror_selector: Arc<dyn MirrorSelector>,
    proxy_selector: Arc<dyn ProxySelector>,
    auth_selector: Arc<dyn AuthenticationSelector>,
    transfer_listener: Option<Arc<dyn TransferListener>>,
    repository_listener: Option<Arc<dyn RepositoryListener>>,
    sync_context_factory: Option<Arc<dyn SyncContextFactory>>,
    file_processor: Option<Arc<dyn FileProcessor>>,
}

impl SessionView for Session {
    fn offline(&self) -> bool {
        self.offline
    }

    fn update_policy(&self) -> UpdatePolicy {
        self.update_policy
    }

    fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    fn config_properties(&self) -> &HashMap<String, String> {
        &self.config_properties
    }

    fn system_properties(&self) -> &HashMap<String, String> {
        &self.system_properties
    }

    fn local_repository_manager(&self) -> &Arc<dyn LocalRepositoryManager> {
        &self.local_repo_manager
    }

    fn mirror_selector(&self) -> &Arc<dyn MirrorSelector> {
        &self.mirror_selector
    }

    fn proxy_selector(&self) -> &Arc<dyn ProxySelector> {
        &self.proxy_selector
    }

    fn authentication_selector(&self) -> &Arc<dyn AuthenticationSelector> {
        &self.auth_selector
    }

    fn transfer_listener(&self) -> Option<&Arc<dyn TransferListener>> {
        self.transfer_listener.as_ref()
    }

    fn repository_listener(&self) -> Option<&Arc<dyn RepositoryListener>> {
        self.repository_listener.as_ref()
    }

    fn sync_context_factory(&self) -> Option<&Arc<dyn SyncContextFactory>> {
        self.sync_context_factory.as_ref()
    }

    fn file_processor(&self) -> Option<&Arc<dyn FileProcessor>> {
        self.file_processor.as_ref()
    }
}

pub struct SessionBuilder {
    config: Config,
    settings: Arc<Settings>,
    sync_context_factory: Option<Arc<dyn SyncContextFactory>>,
    file_processor: Option<Arc<dyn FileProcessor>>,
}

impl SessionBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            settings: Arc::new(Settings::new()),
            sync_context_factory: None,
            file_processor: None,
        }
    }

    pub fn settings(mut self, settings: Arc<Settings>) -> Self {
        self.settings = settings;
        self
    }

    /// Wires in the collaborator's locking implementation; resolutions
    /// sharing a local repository must not corrupt each other's state.
    pub fn sync_context_factory(mut self, factory: Arc<dyn SyncContextFactory>) -> Self {
        self.sync_context_factory = Some(factory);
        self
    }

    pub fn file_processor(mut self, processor: Arc<dyn FileProcessor>) -> Self {
        self.file_processor = Some(processor);
        self
    }

    pub fn build(
        self,
        engine: &dyn RepositoryEngine,
        local: &LocalRepository,
    ) -> Result<Session> {
        let config = self.config;
        debug!(
            target: LOG_TARGET,
            offline = config.offline,
            local_repo = %local.root().display(),
            "building resolution session"
        );

        let local_repo_manager = engine.local_repository_manager(local)?;

        // proxy from environment variables wins when present
        let env_proxy = EnvProxySelector::from_env();
        let proxy_selector: Arc<dyn ProxySelector> = if env_proxy.is_valid() {
            Arc::new(env_proxy)
        } else {
            self.settings.clone()
        };
        let auth_selector: Arc<dyn AuthenticationSelector> = self.settings.clone();
        let mirror_selector: Arc<dyn MirrorSelector> = self.settings.clone();

        let (transfer_listener, repository_listener) = if config.log_level > LogLevel::None {
            let verbose = config.log_level >= LogLevel::Verbose;
            (
                Some(Arc::new(TracingTransferListener::new(verbose)) as Arc<dyn TransferListener>),
                Some(Arc::new(TracingRepositoryListener::new(verbose))
                    as Arc<dyn RepositoryListener>),
            )
        } else {
            (None, None)
        };

        let mut config_properties = HashMap::new();
        if let Some(timeout) = config.connect_timeout {
            config_properties.insert(
                PROP_CONNECT_TIMEOUT.to_string(),
                timeout.as_millis().to_string(),
            );
        }
        if let Some(timeout) = config.request_timeout {
            config_properties.insert(
                PROP_REQUEST_TIMEOUT.to_string(),
                timeout.as_millis().to_string(),
            );
        }

        Ok(Session {
            offline: config.offline,
            update_policy: if config.force_refresh {
                UpdatePolicy::Always
            } else {
                UpdatePolicy::Never
            },
            connect_timeout: config.connect_timeout,
            request_timeout: config.request_timeout,
            config_properties,
            system_properties: env::vars().collect(),
            local_repo_manager,
            mirror_selector,
            proxy_selector,
            auth_selector,
            transfer_listener,
            repository_listener,
            sync_context_factory: self.sync_context_factory,
            file_processor: self.file_processor,
        })
    }
}

/// Forwards every accessor to the wrapped session except the
/// system-properties view.
pub struct PropertyOverrideSession {
    inner: Arc<dyn SessionView>,
    properties: HashMap<String, String>,
}

impl PropertyOverrideSession {
    pub fn new(inner: Arc<dyn SessionView>, properties: HashMap<String, String>) -> Self {
        Self { inner, properties }
    }
}

impl SessionView for PropertyOverrideSession {
    fn offline(&self) -> bool {
        self.inner.offline()
    }

    fn update_policy(&self) -> UpdatePolicy {
        self.inner.update_policy()
    }

    fn connect_timeout(&self) -> Option<Duration> {
        self.inner.connect_timeout()
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.inner.request_timeout()
    }

    fn config_properties(&self) -> &HashMap<String, String> {
        self.inner.config_properties()
    }

    fn system_properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    fn local_repository_manager(&self) -> &Arc<dyn LocalRepositoryManager> {
        self.inner.local_repository_manager()
    }

    fn mirror_selector(&self) -> &Arc<dyn MirrorSelector> {
        self.inner.mirror_selector()
    }

    fn proxy_selector(&self) -> &Arc<dyn ProxySelector> {
        self.inner.proxy_selector()
    }

    fn authentication_selector(&self) -> &Arc<dyn AuthenticationSelector> {
        self.inner.authentication_selector()
    }

    fn transfer_listener(&self) -> Option<&Arc<dyn TransferListener>> {
        self.inner.transfer_listener()
    }

    fn repository_listener(&self) -> Option<&Arc<dyn RepositoryListener>> {
        self.inner.repository_listener()
    }

    fn sync_context_factory(&self) -> Option<&Arc<dyn SyncContextFactory>> {
        self.inner.sync_context_factory()
    }

    fn file_processor(&self) -> Option<&Arc<dyn FileProcessor>> {
        self.inner.file_processor()
    }
}
