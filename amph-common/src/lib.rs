// amph-common/src/lib.rs
pub mod config;
pub mod coords;
pub mod error;
pub mod model;
pub mod repo;

// Re-export key types
pub use config::{Config, LogLevel};
pub use error::{AmphError, Result};
pub use model::{
    ArtifactCoordinate, Dependency, Exclusion, ManagedDependency, ResolvedArtifact, Scope,
};
pub use repo::RemoteRepoSpec;
