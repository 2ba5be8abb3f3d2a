// amph-common/src/repo.rs
//! Repository identifier grammar (`id[(url)]`), well-known alias expansion
//! and update/checksum policy derivation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{AmphError, Result};

pub const CENTRAL_URL: &str = "https://repo1.maven.org/maven2/";
pub const CENTRAL_HTTP_URL: &str = "http://repo1.maven.org/maven2/";
pub const JCENTER_URL: &str = "https://jcenter.bintray.com/";
pub const JCENTER_HTTP_URL: &str = "http://jcenter.bintray.com/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumPolicy {
    Fail,
    Warn,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryPolicy {
    pub enabled: bool,
    pub update: UpdatePolicy,
    pub checksum: ChecksumPolicy,
}

impl RepositoryPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            update: UpdatePolicy::Never,
            checksum: ChecksumPolicy::Warn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    Http,
    Https,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySpec {
    pub kind: ProxyKind,
    pub host: String,
    pub port: u16,
    pub auth: Option<Credentials>,
}

/// A fully configured remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepoSpec {
    pub id: String,
    pub url: String,
    pub releases: RepositoryPolicy,
    pub snapshots: RepositoryPolicy,
    pub proxy: Option<ProxySpec>,
    pub auth: Option<Credentials>,
}

impl RemoteRepoSpec {
    pub fn with_proxy(mut self, proxy: ProxySpec) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_auth(mut self, auth: Credentials) -> Self {
        self.auth = Some(auth);
        self
    }
}

/// Splits `id[(url)]` into its parts. The whole input must match.
pub fn parse_repository(spec: &str) -> Result<(String, Option<String>)> {
    let err = || AmphError::Repository(spec.to_string());
    match spec.find('(') {
        None if spec.is_empty() => Err(err()),
        None => Ok((spec.to_string(), None)),
        Some(0) => Err(err()),
        Some(i) => {
            let id = &spec[..i];
            let rest = &spec[i..];
            if !rest.ends_with(')') {
                return Err(err());
            }
            let url = &rest[1..rest.len() - 1];
            if url.is_empty() || url.contains(')') {
                return Err(err());
            }
            Ok((id.to_string(), Some(url.to_string())))
        }
    }
}

/// Expansion strings for the fixed well-known repository identifiers. The
/// `local` entry points at the configured local repository root.
pub fn well_known_repository(id: &str, local_root: &Path) -> Option<String> {
    match id {
        "central" => Some(format!("central({CENTRAL_URL})")),
        "central-http" => Some(format!("central({CENTRAL_HTTP_URL})")),
        "jcenter" => Some(format!("jcenter({JCENTER_URL})")),
        "jcenter-http" => Some(format!("jcenter({JCENTER_HTTP_URL})")),
        "local" => Some(format!("local({})", file_url(local_root))),
        _ => None,
    }
}

/// Resolves a repository string to an `(id, url)` pair: explicit URLs win,
/// well-known identifiers expand (recursively, through the normal grammar),
/// and any other bare identifier is reused as the URL.
pub fn resolve_repository(spec: &str, local_root: &Path) -> Result<(String, String)> {
    let (id, url) = parse_repository(spec)?;
    match url {
        Some(url) => Ok((id, url)),
        None => match well_known_repository(&id, local_root) {
            Some(expansion) => resolve_repository(&expansion, local_root),
            None => {
                let url = id.clone();
                Ok((id, url))
            }
        },
    }
}

/// Resolves and attaches policies. Local `file:` repositories are trusted:
/// checksum validation is disabled on both policies, snapshots included.
pub fn configure_repository(
    spec: &str,
    allow_snapshots: bool,
    force_refresh: bool,
    local_root: &Path,
) -> Result<RemoteRepoSpec> {
    let (id, url) = resolve_repository(spec, local_root)?;

    let mut releases = release_policy(force_refresh);
    let mut snapshots = if allow_snapshots {
        snapshot_policy(force_refresh)
    } else {
        RepositoryPolicy::disabled()
    };
    if url.starts_with("file:") {
        releases.checksum = ChecksumPolicy::Ignore;
        snapshots = releases;
    }

    debug!(target: "amph", %id, %url, "configured repository");
    Ok(RemoteRepoSpec {
        id,
        url,
        releases,
        snapshots,
        proxy: None,
        auth: None,
    })
}

fn release_policy(force_refresh: bool) -> RepositoryPolicy {
    RepositoryPolicy {
        enabled: true,
        update: if force_refresh {
            UpdatePolicy::Always
        } else {
            UpdatePolicy::Never
        },
        checksum: ChecksumPolicy::Warn,
    }
}

fn snapshot_policy(force_refresh: bool) -> RepositoryPolicy {
    release_policy(force_refresh)
}

fn file_url(root: &Path) -> String {
    Url::from_directory_path(root)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("file:{}", root.display()))
}
