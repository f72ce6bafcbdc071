//! Constraint-propagating selection engine.
//!
//! Maintains the set of currently-selected components in response to
//! discrete toggle events. Each toggle runs one bounded breadth-first
//! propagation pass over the dependency graph with a visited set, so a
//! pass terminates and re-applying a toggle with no net change produces
//! no further cascades. The engine has no I/O side effects.

use std::collections::{HashSet, VecDeque};

use crate::context::Side;
use crate::manifest::Component;

use super::graph::DependencyGraph;

/// One propagation step in a toggle pass.
#[derive(Debug, Clone, Copy)]
enum Event {
    Select(usize),
    Deselect(usize),
}

/// Selection state over a manifest's components for one install side.
pub struct SelectionEngine {
    components: Vec<Component>,
    graph: DependencyGraph,
    selected: Vec<bool>,
    side: Side,
}

impl SelectionEngine {
    /// Build the engine and apply the manifest's default selection:
    /// every required component, plus optional components flagged
    /// recommended, with group exclusivity applied in manifest order.
    pub fn new(components: Vec<Component>, side: Side) -> Self {
        let graph = DependencyGraph::build(&components);
        let selected = vec![false; components.len()];
        let mut engine = Self {
            components,
            graph,
            selected,
            side,
        };

        for i in 0..engine.components.len() {
            let component = &engine.components[i];
            if !component.applies_to(side) {
                continue;
            }
            if !component.is_optional(side) || component.recommended {
                engine.propagate(Event::Select(i));
            }
        }
        engine
    }

    /// Whether the named component is currently selected.
    pub fn is_selected(&self, name: &str) -> bool {
        self.graph
            .lookup(name)
            .map(|i| self.selected[i])
            .unwrap_or(false)
    }

    /// Whether a toggle on the named component would have any effect.
    ///
    /// Required components are inert, as are components that do not apply
    /// to this side and nested options whose parent is not selected.
    pub fn is_actionable(&self, name: &str) -> bool {
        let Some(i) = self.graph.lookup(name) else {
            return false;
        };
        let component = &self.components[i];
        if !component.applies_to(self.side) || !component.is_optional(self.side) {
            return false;
        }
        if component.parent.is_empty() {
            return true;
        }
        self.graph
            .lookup(&component.parent)
            .map(|p| self.selected[p])
            .unwrap_or(true)
    }

    /// Flip the named component's selection, propagating constraints.
    ///
    /// Toggles on inert components are no-ops.
    pub fn toggle(&mut self, name: &str) {
        if self.is_selected(name) {
            self.deselect(name);
        } else {
            self.select(name);
        }
    }

    /// Select the named component, forcing its hard dependencies on and
    /// applying group exclusivity.
    pub fn select(&mut self, name: &str) {
        if !self.is_actionable(name) {
            return;
        }
        if let Some(i) = self.graph.lookup(name) {
            self.propagate(Event::Select(i));
        }
    }

    /// Deselect the named component, cascading off everything that
    /// depended on it and every nested descendant.
    pub fn deselect(&mut self, name: &str) {
        if !self.is_actionable(name) {
            return;
        }
        if let Some(i) = self.graph.lookup(name) {
            self.propagate(Event::Deselect(i));
        }
    }

    /// Currently-selected components, in manifest order.
    pub fn selected(&self) -> Vec<&Component> {
        self.components
            .iter()
            .enumerate()
            .filter(|(i, _)| self.selected[*i])
            .map(|(_, c)| c)
            .collect()
    }

    /// Number of selected components that count toward user-facing totals
    /// (hidden and library components excluded).
    pub fn visible_selected_count(&self) -> usize {
        self.components
            .iter()
            .enumerate()
            .filter(|(i, c)| self.selected[*i] && !c.hidden && !c.library)
            .count()
    }

    /// Run one bounded propagation pass.
    ///
    /// Each component is processed at most once per pass; the first event
    /// that reaches it wins. This guarantees termination and makes a
    /// repeated toggle with no net change a strict no-op.
    fn propagate(&mut self, root: Event) {
        let mut visited: HashSet<usize> = HashSet::new();
        let mut queue: VecDeque<Event> = VecDeque::new();
        queue.push_back(root);

        while let Some(event) = queue.pop_front() {
            match event {
                Event::Select(i) => {
                    if !visited.insert(i) {
                        continue;
                    }
                    if self.selected[i] || !self.components[i].applies_to(self.side) {
                        continue;
                    }
                    self.selected[i] = true;

                    let component = &self.components[i];

                    // Group exclusivity applies when an optional,
                    // recommended member of a non-empty group comes on.
                    if component.is_optional(self.side)
                        && component.recommended
                        && !component.group.is_empty()
                    {
                        for peer in self.graph.group_peers(&component.group, i) {
                            if self.selected[peer] {
                                queue.push_back(Event::Deselect(peer));
                            }
                        }
                    }

                    // Hard dependencies come on with their dependent.
                    for &dep in self.graph.requires(i) {
                        if !self.selected[dep] {
                            queue.push_back(Event::Select(dep));
                        }
                    }
                }
                Event::Deselect(i) => {
                    if !visited.insert(i) {
                        continue;
                    }
                    if !self.selected[i] {
                        continue;
                    }
                    // Required components never come off.
                    if self.components[i].is_required(self.side) {
                        continue;
                    }
                    self.selected[i] = false;

                    // Anything that depended on this component has lost
                    // its precondition and cascades off with it.
                    for &dependent in self.graph.dependents(i) {
                        if self.selected[dependent] {
                            queue.push_back(Event::Deselect(dependent));
                        }
                    }

                    // Nested children are only meaningful under a selected
                    // parent; they cascade off recursively.
                    for &child in self.graph.children(i) {
                        if self.selected[child] {
                            queue.push_back(Event::Deselect(child));
                        }
                    }

                    // Of this component's own dependencies, only library
                    // components with no remaining dependents are
                    // retracted; non-library dependencies are left for the
                    // user to reconsider.
                    for &dep in self.graph.requires(i) {
                        if self.selected[dep]
                            && self.components[dep].library
                            && !self.has_selected_dependent(dep)
                        {
                            queue.push_back(Event::Deselect(dep));
                        }
                    }
                }
            }
        }
    }

    fn has_selected_dependent(&self, i: usize) -> bool {
        self.graph
            .dependents(i)
            .iter()
            .any(|&d| self.selected[d])
    }
}
