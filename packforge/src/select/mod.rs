//! Component selection under exclusivity, nesting, and dependency
//! constraints.
//!
//! The engine is a pure state-transition function over
//! (current selection set, toggle event) and is called synchronously on
//! every user toggle. Constraint handling is a breadth-first walk over an
//! explicit [`DependencyGraph`] rather than per-direction cascades, which
//! bounds propagation and makes repeated toggles idempotent.

mod engine;
mod graph;

pub use engine::SelectionEngine;
pub use graph::DependencyGraph;
