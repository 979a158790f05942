//! Registry mapping backend tags to adapters.
//!
//! Adding a backend is one `register` call; the dispatcher never matches on
//! concrete config types.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::HookConfig;
use crate::workspace::BackendKind;

use super::{BackendAdapter, Confirm, HookAdapter};

/// Registry of available backend adapters, at most one per tag.
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<BackendKind, Box<dyn BackendAdapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with one [`HookAdapter`] per configured hook.
    pub fn from_hooks<'a>(
        hooks: impl IntoIterator<Item = (BackendKind, &'a HookConfig)>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        let mut registry = Self::new();
        for (backend, hook) in hooks {
            registry.register(Box::new(HookAdapter::new(
                backend,
                hook.clone(),
                Arc::clone(&confirm),
            )));
        }
        registry
    }

    /// Register an adapter under its own tag, returning any adapter it replaces.
    pub fn register(
        &mut self,
        adapter: Box<dyn BackendAdapter>,
    ) -> Option<Box<dyn BackendAdapter>> {
        let backend = adapter.backend();
        let replaced = self.adapters.insert(backend, adapter);
        if replaced.is_some() {
            tracing::debug!("Replaced adapter for {} backend", backend);
        }
        replaced
    }

    /// Get the adapter for a tag.
    pub fn get(&self, backend: BackendKind) -> Option<&dyn BackendAdapter> {
        self.adapters.get(&backend).map(|a| a.as_ref())
    }

    pub fn contains(&self, backend: BackendKind) -> bool {
        self.adapters.contains_key(&backend)
    }

    /// List registered tags in a stable order.
    pub fn kinds(&self) -> Vec<BackendKind> {
        self.adapters.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
