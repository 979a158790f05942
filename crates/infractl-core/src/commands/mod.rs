//! High-level commands for infractl operations.
//!
//! This module provides the public API called by the CLI frontend: the
//! start/stop/patch lifecycle commands, sign-in, and local initialization.

pub mod auth;
pub mod init;
pub mod lifecycle;

pub use auth::{AuthCommand, SignInReport};
pub use init::{InitReport, initialize};
pub use lifecycle::{LifecycleOptions, LifecycleReport, ResourcesCommand};
