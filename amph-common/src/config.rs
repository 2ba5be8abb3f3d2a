// amph-common/src/config.rs
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::UserDirs;
use tracing::debug;

use super::coords::empty_to_none;
use super::error::{AmphError, Result};

pub const PROP_OFFLINE: &str = "amph.offline";
pub const PROP_CONNECT_TIMEOUT: &str = "amph.connect.timeout";
pub const PROP_REQUEST_TIMEOUT: &str = "amph.request.timeout";

pub const ENV_CONNECT_TIMEOUT: &str = "AMPH_CONNECT_TIMEOUT";
pub const ENV_REQUEST_TIMEOUT: &str = "AMPH_REQUEST_TIMEOUT";

/// Relative to the user's home directory.
const DEFAULT_LOCAL_REPO: &str = ".m2/repository";

/// Diagnostic verbosity, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    #[default]
    None,
    Quiet,
    Verbose,
    Debug,
}

impl LogLevel {
    /// True when messages at `level` should be emitted under this setting.
    pub fn is_logging(self, level: LogLevel) -> bool {
        level <= self
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub local_repo_root: PathBuf,
    pub offline: bool,
    pub force_refresh: bool,
    pub log_level: LogLevel,
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Assembles the resolver configuration from a caller-supplied property
    /// map with environment-variable fallback for the timeouts.
    pub fn load(
        properties: &BTreeMap<String, String>,
        force_refresh: bool,
        log_level: LogLevel,
    ) -> Result<Self> {
        let offline = flag_set(properties, PROP_OFFLINE, false);
        let connect_timeout =
            parse_timeout(property_or_env(properties, PROP_CONNECT_TIMEOUT, ENV_CONNECT_TIMEOUT))?;
        let request_timeout =
            parse_timeout(property_or_env(properties, PROP_REQUEST_TIMEOUT, ENV_REQUEST_TIMEOUT))?;

        let local_repo_root = home_dir().join(DEFAULT_LOCAL_REPO);

        debug!(target: "amph", offline, ?connect_timeout, ?request_timeout, "configuration loaded");
        Ok(Self {
            local_repo_root,
            offline,
            force_refresh,
            log_level,
            connect_timeout,
            request_timeout,
        })
    }

    /// Overrides the local repository root (defaults to `~/.m2/repository`).
    pub fn with_local_repository(mut self, root: impl Into<PathBuf>) -> Self {
        self.local_repo_root = root.into();
        self
    }

    pub fn local_repo_root(&self) -> &Path {
        &self.local_repo_root
    }
}

fn home_dir() -> PathBuf {
    UserDirs::new().map_or_else(|| PathBuf::from("/"), |ud| ud.home_dir().to_path_buf())
}

/// Looks up `prop` in the property map, falling back to the environment
/// variable `env_var`. Blank values count as unset.
pub fn property_or_env(
    properties: &BTreeMap<String, String>,
    prop: &str,
    env_var: &str,
) -> Option<String> {
    properties
        .get(prop)
        .and_then(|v| empty_to_none(v))
        .or_else(|| env::var(env_var).ok().and_then(|v| empty_to_none(&v)))
}

/// Boolean-like property: present-but-empty and `true` both count as set.
pub fn flag_set(properties: &BTreeMap<String, String>, prop: &str, default: bool) -> bool {
    match properties.get(prop) {
        None => default,
        Some(v) => {
            let v = v.trim();
            v.is_empty() || v.eq_ignore_ascii_case("true")
        }
    }
}

/// Timeouts accept raw milliseconds (`"1500"`) or humantime syntax (`"30s"`).
fn parse_timeout(value: Option<String>) -> Result<Option<Duration>> {
    let Some(value) = value else {
        return Ok(None);
    };
    if let Ok(millis) = value.parse::<u64>() {
        return Ok(Some(Duration::from_millis(millis)));
    }
    humantime::parse_duration(&value)
        .map(Some)
        .map_err(|e| AmphError::Config(format!("Invalid timeout value '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn offline_flag_empty_string_counts_as_true() {
        let p = props(&[(PROP_OFFLINE, "")]);
        let config = Config::load(&p, false, LogLevel::None).unwrap();
        assert!(config.offline);
    }

    #[test]
    fn offline_flag_true_and_false() {
        let p = props(&[(PROP_OFFLINE, "true")]);
        assert!(Config::load(&p, false, LogLevel::None).unwrap().offline);

        let p = props(&[(PROP_OFFLINE, "false")]);
        assert!(!Config::load(&p, false, LogLevel::None).unwrap().offline);

        let p = props(&[]);
        assert!(!Config::load(&p, false, LogLevel::None).unwrap().offline);
    }

    #[test]
    fn timeouts_accept_millis_and_humantime() {
        let p = props(&[
            (PROP_CONNECT_TIMEOUT, "1500"),
            (PROP_REQUEST_TIMEOUT, "30s"),
        ]);
        let config = Config::load(&p, false, LogLevel::None).unwrap();
        assert_eq!(config.connect_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn invalid_timeout_is_a_config_error() {
        let p = props(&[(PROP_CONNECT_TIMEOUT, "soon")]);
        assert!(matches!(
            Config::load(&p, false, LogLevel::None),
            Err(AmphError::Config(_))
        ));
    }

    #[test]
    fn property_wins_over_environment() {
        env::set_var("AMPH_TEST_FALLBACK_A", "9000");
        let p = props(&[("amph.test.timeout", "1000")]);
        assert_eq!(
            property_or_env(&p, "amph.test.timeout", "AMPH_TEST_FALLBACK_A"),
            Some("1000".to_string())
        );
        assert_eq!(
            property_or_env(&props(&[]), "amph.test.timeout", "AMPH_TEST_FALLBACK_A"),
            Some("9000".to_string())
        );
        env::remove_var("AMPH_TEST_FALLBACK_A");
    }

    #[test]
    fn log_level_ordering_gates_messages() {
        assert!(LogLevel::Debug.is_logging(LogLevel::Verbose));
        assert!(LogLevel::Verbose.is_logging(LogLevel::Quiet));
        assert!(!LogLevel::Quiet.is_logging(LogLevel::Verbose));
        assert!(!LogLevel::None.is_logging(LogLevel::Quiet));
    }
}
