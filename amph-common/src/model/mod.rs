pub mod artifact;
pub mod dependency;

pub use artifact::{ArtifactCoordinate, ResolvedArtifact};
pub use dependency::{Dependency, Exclusion, ManagedDependency, Scope};
