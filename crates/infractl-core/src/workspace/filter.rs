//! Config selection and dependency ordering.
//!
//! Ordering is computed over the whole workspace first and selection is
//! applied afterwards, so a selected subset keeps the relative order it has
//! in the full creation sequence.

use std::collections::{BTreeSet, HashMap};

use crate::types::ConfigOrder;

use super::{InfraConfig, WorkspaceDefinition, WorkspaceError};

/// Which configs of a workspace to act on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSelection {
    /// Only configs scoped to this environment
    pub env: Option<String>,
    /// Only the config with this name
    pub config: Option<String>,
}

impl ConfigSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = Some(config.into());
        self
    }

    pub fn includes(&self, config: &InfraConfig) -> bool {
        if let Some(ref env) = self.env
            && !config.in_env(env)
        {
            return false;
        }
        if let Some(ref name) = self.config
            && name != &config.name
        {
            return false;
        }
        true
    }
}

/// Select the configs to act on and order them for the given operation.
///
/// An empty result is valid and means there is nothing to dispatch.
pub fn prepare_configs(
    workspace: &WorkspaceDefinition,
    selection: &ConfigSelection,
    order: ConfigOrder,
) -> Result<Vec<InfraConfig>, WorkspaceError> {
    let mut indices = creation_order(&workspace.configs)?;
    if order == ConfigOrder::ForTeardown {
        indices.reverse();
    }

    let prepared: Vec<InfraConfig> = indices
        .into_iter()
        .map(|i| &workspace.configs[i])
        .filter(|c| selection.includes(c))
        .cloned()
        .collect();

    tracing::debug!(
        selected = prepared.len(),
        declared = workspace.configs.len(),
        ?order,
        "Prepared workspace configs"
    );
    Ok(prepared)
}

/// Stable topological sort: dependencies first, ties in declaration order.
fn creation_order(configs: &[InfraConfig]) -> Result<Vec<usize>, WorkspaceError> {
    let index: HashMap<&str, usize> = configs
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.as_str(), i))
        .collect();

    let mut dependencies: Vec<Vec<usize>> = Vec::with_capacity(configs.len());
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); configs.len()];
    for (i, config) in configs.iter().enumerate() {
        let mut deps = Vec::with_capacity(config.depends_on.len());
        for name in &config.depends_on {
            let dep = *index
                .get(name.as_str())
                .ok_or_else(|| WorkspaceError::UnknownDependency {
                    config: config.name.clone(),
                    dependency: name.clone(),
                })?;
            deps.push(dep);
            dependents[dep].push(i);
        }
        dependencies.push(deps);
    }

    let mut pending: Vec<usize> = dependencies.iter().map(Vec::len).collect();
    let mut ready: BTreeSet<usize> = pending
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(i, _)| i)
        .collect();

    let mut ordered = Vec::with_capacity(configs.len());
    while let Some(next) = ready.pop_first() {
        ordered.push(next);
        for &dependent in &dependents[next] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if ordered.len() != configs.len() {
        return Err(WorkspaceError::Cycle(find_cycle(configs, &dependencies, &pending)));
    }
    Ok(ordered)
}

/// Walk unresolved dependencies from any unresolved config until a config
/// repeats; every unresolved config has at least one unresolved dependency.
fn find_cycle(
    configs: &[InfraConfig],
    dependencies: &[Vec<usize>],
    pending: &[usize],
) -> Vec<String> {
    let Some(start) = pending.iter().position(|count| *count > 0) else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(&next) = dependencies[current].iter().find(|&&d| pending[d] > 0) else {
            break;
        };
        if let Some(pos) = path.iter().position(|&p| p == next) {
            let mut cycle: Vec<String> = path[pos..]
                .iter()
                .map(|&i| configs[i].name.clone())
                .collect();
            cycle.push(configs[next].name.clone());
            return cycle;
        }
        path.push(next);
        current = next;
    }

    path.into_iter().map(|i| configs[i].name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::BackendKind;

    fn names(configs: &[InfraConfig]) -> Vec<&str> {
        configs.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_declaration_order_without_dependencies() {
        let ws = WorkspaceDefinition::new(vec![
            InfraConfig::new("a", BackendKind::Container),
            InfraConfig::new("b", BackendKind::Orchestrator),
            InfraConfig::new("c", BackendKind::Cloud),
        ]);

        let create = prepare_configs(&ws, &ConfigSelection::new(), ConfigOrder::ForCreation)
            .expect("ordering succeeds");
        assert_eq!(names(&create), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dependencies_come_first() {
        let ws = WorkspaceDefinition::new(vec![
            InfraConfig::new("compute", BackendKind::Cloud).with_dependency("network"),
            InfraConfig::new("app", BackendKind::Orchestrator).with_dependency("compute"),
            InfraConfig::new("network", BackendKind::Cloud),
        ]);

        let create = prepare_configs(&ws, &ConfigSelection::new(), ConfigOrder::ForCreation)
            .expect("ordering succeeds");
        assert_eq!(names(&create), vec!["network", "compute", "app"]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let ws = WorkspaceDefinition::new(vec![
            InfraConfig::new("a", BackendKind::Cloud).with_dependency("b"),
            InfraConfig::new("b", BackendKind::Cloud).with_dependency("a"),
            InfraConfig::new("c", BackendKind::Cloud),
        ]);

        let err = prepare_configs(&ws, &ConfigSelection::new(), ConfigOrder::ForCreation)
            .expect_err("cycle is rejected");
        match err {
            WorkspaceError::Cycle(path) => {
                assert_eq!(path.first(), path.last());
                assert!(path.contains(&"a".to_string()));
                assert!(path.contains(&"b".to_string()));
                assert!(!path.contains(&"c".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_selection_includes() {
        let config = InfraConfig::new("dev-docker", BackendKind::Container).with_env("dev");

        assert!(ConfigSelection::new().includes(&config));
        assert!(ConfigSelection::new().with_env("dev").includes(&config));
        assert!(!ConfigSelection::new().with_env("prd").includes(&config));
        assert!(!ConfigSelection::new().with_config("other").includes(&config));
        assert!(
            !ConfigSelection::new()
                .with_env("dev")
                .includes(&InfraConfig::new("unscoped", BackendKind::Cloud))
        );
    }
}
