//! Confirmation seam for destructive actions.
//!
//! The core never reads from the terminal; frontends inject an implementation.

/// Asks the operator whether to proceed.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> anyhow::Result<bool>;
}

/// Refuses every prompt. Used when no terminal is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&self, prompt: &str) -> anyhow::Result<bool> {
        tracing::warn!("Declining without a terminal: {}", prompt);
        Ok(false)
    }
}

/// Accepts every prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> anyhow::Result<bool> {
        Ok(true)
    }
}
