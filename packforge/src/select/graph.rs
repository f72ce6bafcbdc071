//! Dependency graph over a manifest's components.
//!
//! Nodes are components; edges are the three constraint kinds the
//! selection engine propagates over: requires, group-exclusive-with, and
//! nested-under. Built once per manifest and never mutated.

use std::collections::HashMap;

use tracing::warn;

use crate::manifest::Component;

/// Immutable constraint graph, indexed by component position.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Component name to index.
    index: HashMap<String, usize>,
    /// Forward requires edges: `requires[i]` are the indices `i` depends on.
    requires: Vec<Vec<usize>>,
    /// Reverse requires edges: `dependents[i]` are the indices depending on `i`.
    dependents: Vec<Vec<usize>>,
    /// Nested-under reverse edges: direct children of each component.
    children: Vec<Vec<usize>>,
    /// Group key to member indices, manifest order.
    groups: HashMap<String, Vec<usize>>,
}

impl DependencyGraph {
    /// Build the graph from parsed components.
    ///
    /// Dependency or parent references to names that do not exist in the
    /// manifest are logged and ignored.
    pub fn build(components: &[Component]) -> Self {
        let index: HashMap<String, usize> = components
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();

        let mut requires = vec![Vec::new(); components.len()];
        let mut dependents = vec![Vec::new(); components.len()];
        let mut children = vec![Vec::new(); components.len()];
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, component) in components.iter().enumerate() {
            for dep in &component.dependencies {
                match index.get(dep) {
                    Some(&j) => {
                        requires[i].push(j);
                        dependents[j].push(i);
                    }
                    None => {
                        warn!(component = %component.name, dependency = %dep,
                              "dependency not present in manifest");
                    }
                }
            }

            if !component.parent.is_empty() {
                match index.get(&component.parent) {
                    Some(&p) => children[p].push(i),
                    None => {
                        warn!(component = %component.name, parent = %component.parent,
                              "parent not present in manifest");
                    }
                }
            }

            if !component.group.is_empty() {
                groups.entry(component.group.clone()).or_default().push(i);
            }
        }

        Self {
            index,
            requires,
            dependents,
            children,
            groups,
        }
    }

    /// Index of a component by name.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Indices this component requires.
    pub fn requires(&self, i: usize) -> &[usize] {
        &self.requires[i]
    }

    /// Indices that require this component.
    pub fn dependents(&self, i: usize) -> &[usize] {
        &self.dependents[i]
    }

    /// Direct nested children of this component.
    pub fn children(&self, i: usize) -> &[usize] {
        &self.children[i]
    }

    /// Other members of the given group key, excluding `i` itself.
    pub fn group_peers(&self, group: &str, i: usize) -> Vec<usize> {
        self.groups
            .get(group)
            .map(|members| members.iter().copied().filter(|&j| j != i).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::InstallType;
    use crate::testutil::component;

    #[test]
    fn test_build_requires_edges() {
        let mut x = component("x", InstallType::Mod);
        x.dependencies = vec!["y".to_string()];
        let y = component("y", InstallType::Library);

        let graph = DependencyGraph::build(&[x, y]);
        let xi = graph.lookup("x").unwrap();
        let yi = graph.lookup("y").unwrap();

        assert_eq!(graph.requires(xi), &[yi]);
        assert_eq!(graph.dependents(yi), &[xi]);
        assert!(graph.requires(yi).is_empty());
    }

    #[test]
    fn test_build_ignores_unknown_references() {
        let mut x = component("x", InstallType::Mod);
        x.dependencies = vec!["ghost".to_string()];
        x.parent = "phantom".to_string();

        let graph = DependencyGraph::build(&[x]);
        let xi = graph.lookup("x").unwrap();
        assert!(graph.requires(xi).is_empty());
    }

    #[test]
    fn test_group_peers() {
        let mut a = component("a", InstallType::Mod);
        a.group = "g".to_string();
        let mut b = component("b", InstallType::Mod);
        b.group = "g".to_string();
        let c = component("c", InstallType::Mod);

        let graph = DependencyGraph::build(&[a, b, c]);
        let ai = graph.lookup("a").unwrap();
        let bi = graph.lookup("b").unwrap();

        assert_eq!(graph.group_peers("g", ai), vec![bi]);
        assert_eq!(graph.group_peers("g", bi), vec![ai]);
        assert!(graph.group_peers("missing", ai).is_empty());
    }

    #[test]
    fn test_children_edges() {
        let p = component("p", InstallType::Mod);
        let mut child = component("child", InstallType::Mod);
        child.parent = "p".to_string();

        let graph = DependencyGraph::build(&[p, child]);
        let pi = graph.lookup("p").unwrap();
        let ci = graph.lookup("child").unwrap();
        assert_eq!(graph.children(pi), &[ci]);
    }
}
