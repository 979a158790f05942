//! Infractl Core Library
//!
//! Provides the domain logic for running start, stop and patch across the
//! configs of a workspace, dispatching each config to the backend adapter
//! registered for its tag.

pub mod api;
pub mod auth;
pub mod backend;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod settings;
pub mod types;
pub mod workspace;

/// Re-exports of commonly used types
pub mod prelude {
    // Workspace
    pub use crate::workspace::{
        BackendKind, ConfigSelection, InfraConfig, ResourceSpec, WorkspaceDefinition,
        WorkspaceError, prepare_configs,
    };

    // Operations
    pub use crate::types::{ConfigOrder, ExecutionMode, LifecycleOperation, ResourceFilter};

    // Backends
    pub use crate::backend::{
        AdapterError, AdapterRegistry, AdapterRequest, BackendAdapter, Confirm, HookAdapter,
    };

    // Dispatch
    pub use crate::dispatch::{
        LifecycleDispatcher, LifecycleResult, ProgressReporter, VariantOutcome, VariantReport,
    };

    // Configuration
    pub use crate::config::{CliConfig, CliConfigStore, HookConfig};

    // Commands
    pub use crate::commands::{LifecycleOptions, LifecycleReport, ResourcesCommand};
    pub use crate::context::AppContext;
}
