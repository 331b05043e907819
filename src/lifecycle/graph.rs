//! Dependency graph between registered services.
//!
//! Pure data: a mapping from service name to the names it depends on, built
//! incrementally as services register. Dependency names may refer to services
//! that are not (yet) registered.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Node names in insertion order.
    nodes: Vec<String>,
    /// name → declared dependencies (deduplicated, in declaration order).
    edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with its dependencies. Returns `false` if the node already exists.
    pub fn insert(&mut self, name: &str, dependencies: &[String]) -> bool {
        if self.edges.contains_key(name) {
            return false;
        }

        let mut deps: Vec<String> = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            if !deps.contains(dep) {
                deps.push(dep.clone());
            }
        }

        self.nodes.push(name.to_string());
        self.edges.insert(name.to_string(), deps);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    /// Node names in insertion order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Declared dependencies of `name` (empty for unknown names).
    pub fn dependencies(&self, name: &str) -> &[String] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Dependencies of `name` that have no node in the graph.
    pub fn missing_dependencies(&self, name: &str) -> Vec<String> {
        self.dependencies(name)
            .iter()
            .filter(|dep| !self.contains(dep))
            .cloned()
            .collect()
    }

    /// Every dependency name referenced anywhere that has no node.
    pub fn unresolved(&self) -> Vec<String> {
        let mut unresolved: Vec<String> = Vec::new();
        for name in &self.nodes {
            for dep in self.dependencies(name) {
                if !self.contains(dep) && !unresolved.contains(dep) {
                    unresolved.push(dep.clone());
                }
            }
        }
        unresolved
    }

    /// True when every dependency of `name` is in `satisfied`.
    pub fn is_satisfied(&self, name: &str, satisfied: &HashSet<String>) -> bool {
        self.dependencies(name).iter().all(|dep| satisfied.contains(dep))
    }

    /// Reverse edges: name → services that depend on it.
    ///
    /// Only registered nodes appear as keys; edges pointing at unknown names are dropped.
    pub fn dependents(&self) -> HashMap<String, Vec<String>> {
        let mut reverse: HashMap<String, Vec<String>> = self
            .nodes
            .iter()
            .map(|name| (name.clone(), Vec::new()))
            .collect();

        for name in &self.nodes {
            for dep in self.dependencies(name) {
                match reverse.get_mut(dep) {
                    Some(list) => list.push(name.clone()),
                    None => {
                        tracing::debug!(service = %name, dependency = %dep, "Ignoring unregistered dependency in reverse graph");
                    }
                }
            }
        }

        reverse
    }
}
