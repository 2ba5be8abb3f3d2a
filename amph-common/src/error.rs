use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AmphError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("Could not parse dependency: {0}")]
    Coordinate(String),

    #[error("Illegal exclusion dependency coordinates: {0} (in exclusion {1})")]
    Exclusion(String, String),

    #[error("Could not parse dependency management: {0}")]
    ManagedCoordinate(String),

    #[error("No version information is provided for managed dependency {0}")]
    MissingManagedVersion(String),

    #[error("Could not parse repository: {0}")]
    Repository(String),

    #[error("Error resolving dependencies: {0}")]
    Resolution(String),

    #[error("Could not find any version of artifact {0} (looking for: {1})")]
    VersionNotFound(String, String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for AmphError {
    fn from(err: std::io::Error) -> Self {
        AmphError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for AmphError {
    fn from(err: reqwest::Error) -> Self {
        AmphError::Http(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, AmphError>;
