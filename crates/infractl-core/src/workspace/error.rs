//! Errors raised while loading or ordering a workspace.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("File does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read workspace file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    Parse(String),

    #[error("Config name must not be empty")]
    EmptyName,

    #[error("Duplicate config name: '{0}'")]
    DuplicateConfig(String),

    #[error("Config '{0}' cannot depend on itself")]
    SelfDependency(String),

    #[error("Config '{config}' depends on unknown config '{dependency}'")]
    UnknownDependency { config: String, dependency: String },

    #[error("Circular dependency between configs: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}
