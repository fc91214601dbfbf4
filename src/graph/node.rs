//! Graph node, edge, and tensor-spec records

use crate::dtype::DType;
use crate::tensor::Shape;
use std::collections::BTreeMap;

/// Description of a tensor flowing into or out of a graph node
#[derive(Clone, Debug, PartialEq)]
pub struct TensorSpec {
    /// Stable name of the tensor within the graph
    pub name: String,
    /// Shape at record time
    pub shape: Shape,
    /// Element type at record time
    pub dtype: DType,
    /// Whether a gradient would be tracked for this tensor
    pub requires_grad: bool,
    /// Free-form key/value annotations
    pub metadata: BTreeMap<String, String>,
}

impl TensorSpec {
    /// Create a spec with no gradient tracking and empty metadata
    pub fn new(name: impl Into<String>, shape: Shape, dtype: DType) -> Self {
        Self {
            name: name.into(),
            shape,
            dtype,
            requires_grad: false,
            metadata: BTreeMap::new(),
        }
    }

    /// Set the gradient-tracking flag
    pub fn with_requires_grad(mut self, requires_grad: bool) -> Self {
        self.requires_grad = requires_grad;
        self
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Name and parameters of a recorded operation
#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    /// Operation name (e.g. `"add"`, `"conv2d"`)
    pub name: String,
    /// Operation parameters rendered as strings (stride, padding, axis, ...)
    pub params: BTreeMap<String, String>,
}

impl Operation {
    /// Create an operation with no parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    /// Attach a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// One operation instance in a compute graph
///
/// Node ids follow the `"<opname>_<counter>"` convention and are unique
/// within the owning graph.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    /// Unique node id
    pub id: String,
    /// The operation this node performs
    pub operation: Operation,
    /// Ordered input tensor specs
    pub inputs: Vec<TensorSpec>,
    /// Ordered output tensor specs
    pub outputs: Vec<TensorSpec>,
}

impl GraphNode {
    /// Create a node with empty input/output lists
    pub fn new(id: impl Into<String>, operation: Operation) -> Self {
        Self {
            id: id.into(),
            operation,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Set the ordered input specs
    pub fn with_inputs(mut self, inputs: Vec<TensorSpec>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Set the ordered output specs
    pub fn with_outputs(mut self, outputs: Vec<TensorSpec>) -> Self {
        self.outputs = outputs;
        self
    }
}

/// A tensor-flow edge between two nodes
#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    /// Unique edge id within the owning graph
    pub id: String,
    /// Producing node id
    pub source: String,
    /// Consuming node id
    pub target: String,
    /// Index into the source node's outputs
    pub source_output: usize,
    /// Index into the target node's inputs
    pub target_input: usize,
    /// The tensor carried along this edge
    pub spec: TensorSpec,
}

impl GraphEdge {
    /// Create an edge carrying `spec` from `source` output port to `target`
    /// input port
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        source_output: usize,
        target_input: usize,
        spec: TensorSpec,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_output,
            target_input,
            spec,
        }
    }
}
