//! ComputeGraph: node/edge registry with ordering and validation

use super::node::{GraphEdge, GraphNode};
use crate::error::{Error, Result};
use std::collections::{HashMap, VecDeque};

/// Outcome of a structural graph check
///
/// `validate` reports problems as a value so callers can inspect a broken
/// graph without error plumbing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validation {
    /// The graph is structurally well-formed
    Valid,
    /// The graph is broken; the reason names the first violated invariant
    Invalid(String),
}

impl Validation {
    /// Whether the graph passed validation
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    /// The failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Validation::Valid => None,
            Validation::Invalid(reason) => Some(reason),
        }
    }
}

/// Directed graph of operation nodes and tensor-flow edges
///
/// Nodes keep their insertion order, which makes the topological sort
/// deterministic: ties are broken by the order nodes were added.
#[derive(Clone, Debug, Default)]
pub struct ComputeGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
}

impl ComputeGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node
    ///
    /// Fails when a node with the same id is already registered; the graph is
    /// left untouched in that case.
    pub fn add_node(&mut self, node: GraphNode) -> Result<()> {
        if self.index.contains_key(&node.id) {
            return Err(Error::DuplicateNode {
                id: node.id.clone(),
            });
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Register an edge
    ///
    /// Fails when either endpoint node id is absent; no partial edge is
    /// stored.
    pub fn add_edge(&mut self, edge: GraphEdge) -> Result<()> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.index.contains_key(endpoint) {
                return Err(Error::UnknownNode {
                    edge: edge.id.clone(),
                    node: endpoint.clone(),
                });
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Number of nodes
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no nodes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a node id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// All edges in insertion order
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Nodes with no incoming edge, in insertion order
    pub fn input_nodes(&self) -> Vec<&GraphNode> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.target == n.id))
            .collect()
    }

    /// Nodes with no outgoing edge, in insertion order
    pub fn output_nodes(&self) -> Vec<&GraphNode> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.source == n.id))
            .collect()
    }

    /// Deterministic Kahn topological sort
    ///
    /// Ties are broken by node insertion order. Fails when the graph contains
    /// a cycle, for which no topological order is defined.
    pub fn topological_order(&self) -> Result<Vec<&GraphNode>> {
        let mut indegree = vec![0usize; self.nodes.len()];
        for edge in &self.edges {
            indegree[self.index[&edge.target]] += 1;
        }

        let mut queue: VecDeque<usize> = (0..self.nodes.len())
            .filter(|&i| indegree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(i) = queue.pop_front() {
            order.push(&self.nodes[i]);
            let id = &self.nodes[i].id;
            for edge in self.edges.iter().filter(|e| &e.source == id) {
                let target = self.index[&edge.target];
                indegree[target] -= 1;
                if indegree[target] == 0 {
                    queue.push_back(target);
                }
            }
        }

        if order.len() != self.nodes.len() {
            return Err(Error::GraphCycle);
        }
        Ok(order)
    }

    /// Structural well-formedness check
    ///
    /// Verifies that every edge endpoint exists, that every edge's port
    /// indices reference declared specs on the endpoint nodes, and that the
    /// graph is acyclic. Returns the first violation as a value rather than
    /// an error.
    pub fn validate(&self) -> Validation {
        for edge in &self.edges {
            let source = match self.node(&edge.source) {
                Some(n) => n,
                None => {
                    return Validation::Invalid(format!(
                        "edge '{}' references unknown source node '{}'",
                        edge.id, edge.source
                    ));
                }
            };
            let target = match self.node(&edge.target) {
                Some(n) => n,
                None => {
                    return Validation::Invalid(format!(
                        "edge '{}' references unknown target node '{}'",
                        edge.id, edge.target
                    ));
                }
            };
            if edge.source_output >= source.outputs.len() {
                return Validation::Invalid(format!(
                    "edge '{}' references output {} of node '{}', which declares {}",
                    edge.id,
                    edge.source_output,
                    source.id,
                    source.outputs.len()
                ));
            }
            if edge.target_input >= target.inputs.len() {
                return Validation::Invalid(format!(
                    "edge '{}' references input {} of node '{}', which declares {}",
                    edge.id,
                    edge.target_input,
                    target.id,
                    target.inputs.len()
                ));
            }
        }

        if self.topological_order().is_err() {
            return Validation::Invalid("graph contains a structural cycle".to_string());
        }
        Validation::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use crate::error::ErrorKind;
    use crate::graph::{Operation, TensorSpec};
    use crate::tensor::Shape;

    fn spec(name: &str) -> TensorSpec {
        TensorSpec::new(name, Shape::from([1]), DType::F32)
    }

    fn node(id: &str) -> GraphNode {
        GraphNode::new(id, Operation::new("op"))
            .with_inputs(vec![spec("in")])
            .with_outputs(vec![spec("out")])
    }

    fn edge(id: &str, source: &str, target: &str) -> GraphEdge {
        GraphEdge::new(id, source, target, 0, 0, spec(id))
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut g = ComputeGraph::new();
        g.add_node(node("a")).unwrap();
        let err = g.add_node(node("a")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let mut g = ComputeGraph::new();
        g.add_node(node("a")).unwrap();
        let err = g.add_edge(edge("e0", "a", "missing")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_input_output_nodes() {
        let mut g = ComputeGraph::new();
        for id in ["a", "b", "c"] {
            g.add_node(node(id)).unwrap();
        }
        g.add_edge(edge("e0", "a", "b")).unwrap();
        g.add_edge(edge("e1", "b", "c")).unwrap();

        let inputs: Vec<&str> = g.input_nodes().iter().map(|n| n.id.as_str()).collect();
        let outputs: Vec<&str> = g.output_nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(inputs, ["a"]);
        assert_eq!(outputs, ["c"]);
    }

    #[test]
    fn test_topological_order_chain() {
        let mut g = ComputeGraph::new();
        // Insert out of order so the sort has to work for it
        for id in ["c", "a", "b"] {
            g.add_node(node(id)).unwrap();
        }
        g.add_edge(edge("e0", "a", "b")).unwrap();
        g.add_edge(edge("e1", "b", "c")).unwrap();

        let order: Vec<&str> = g
            .topological_order()
            .unwrap()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        let pos = |id: &str| order.iter().position(|&n| n == id).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
    }

    #[test]
    fn test_topological_order_ties_by_insertion() {
        let mut g = ComputeGraph::new();
        for id in ["a", "b", "c"] {
            g.add_node(node(id)).unwrap();
        }
        // No edges: order is pure insertion order
        let order: Vec<&str> = g
            .topological_order()
            .unwrap()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn test_cycle_detected() {
        let mut g = ComputeGraph::new();
        g.add_node(node("a")).unwrap();
        g.add_node(node("b")).unwrap();
        g.add_edge(edge("e0", "a", "b")).unwrap();
        g.add_edge(edge("e1", "b", "a")).unwrap();

        let err = g.topological_order().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(!g.validate().is_valid());
    }

    #[test]
    fn test_validate_port_indices() {
        let mut g = ComputeGraph::new();
        g.add_node(node("a")).unwrap();
        g.add_node(node("b")).unwrap();
        // Output port 3 does not exist on "a"
        g.add_edge(GraphEdge::new("e0", "a", "b", 3, 0, spec("e0")))
            .unwrap();

        match g.validate() {
            Validation::Invalid(reason) => assert!(reason.contains("output 3")),
            Validation::Valid => panic!("expected invalid"),
        }
    }

    #[test]
    fn test_validate_ok() {
        let mut g = ComputeGraph::new();
        g.add_node(node("a")).unwrap();
        g.add_node(node("b")).unwrap();
        g.add_edge(edge("e0", "a", "b")).unwrap();
        assert_eq!(g.validate(), Validation::Valid);
    }
}
