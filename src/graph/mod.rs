//! Compute graph: nodes, edges, ordering, and validation
//!
//! Operations recorded during graph-mode execution are mirrored into a
//! [`ComputeGraph`]. The graph is a passive structure: it never executes
//! anything, it only describes what the eager engine already did.

#[allow(clippy::module_inception)]
mod graph;
mod node;

pub use graph::{ComputeGraph, Validation};
pub use node::{GraphEdge, GraphNode, Operation, TensorSpec};
