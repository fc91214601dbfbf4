//! Execution context: mode switching and the recording bracket

use crate::dtype::{PromotionRules, StrictPromotion};
use crate::error::{Error, Result};
use crate::graph::ComputeGraph;
use crate::tensor::TensorId;
use log::debug;
use std::collections::HashMap;
use std::fmt;

/// How the context presents execution to callers
///
/// Orthogonal to recording: either mode can have a recording bracket open.
/// Computation itself is always eager; Graph mode only signals intent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Plain eager execution
    Eager,
    /// Eager execution with graph-oriented intent
    Graph,
}

/// Per-session execution state
///
/// Holds the current mode, the recording flag, the graph being accumulated
/// while a recording bracket is open, and the promotion rules consulted for
/// binary output dtypes. Created once per logical session and passed
/// explicitly to every recording-layer call; there is no ambient or global
/// context.
pub struct ExecutionContext {
    mode: ExecutionMode,
    recording: bool,
    graph: ComputeGraph,
    // Tensor identity -> (producing node id, output port)
    producers: HashMap<TensorId, (String, usize)>,
    promotions: Box<dyn PromotionRules>,
    capture_leaf_inputs: bool,
}

impl ExecutionContext {
    /// Create a context in Eager mode with strict promotion rules
    pub fn new() -> Self {
        Self {
            mode: ExecutionMode::Eager,
            recording: false,
            graph: ComputeGraph::new(),
            producers: HashMap::new(),
            promotions: Box::new(StrictPromotion),
            capture_leaf_inputs: false,
        }
    }

    /// Create a context with injected promotion rules
    pub fn with_promotion_rules(rules: Box<dyn PromotionRules>) -> Self {
        Self {
            promotions: rules,
            ..Self::new()
        }
    }

    /// Emit dedicated producer nodes for leaf operands while recording
    ///
    /// Off by default: a leaf operand then appears only as an input spec on
    /// the consuming node. On, each previously unseen operand gets its own
    /// `input_<n>` node with one output, wired by an edge.
    pub fn capture_leaf_inputs(&mut self, capture: bool) -> &mut Self {
        self.capture_leaf_inputs = capture;
        self
    }

    /// Current execution mode
    #[inline]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Switch to Graph mode; computation stays eager
    pub fn switch_to_graph(&mut self) {
        debug!("execution mode -> Graph");
        self.mode = ExecutionMode::Graph;
    }

    /// Switch to Eager mode
    pub fn switch_to_eager(&mut self) {
        debug!("execution mode -> Eager");
        self.mode = ExecutionMode::Eager;
    }

    /// Whether a recording bracket is currently open
    #[inline]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Open a recording bracket
    ///
    /// The accumulating graph and producer map are cleared. Non-reentrant:
    /// fails with an invalid-state error if a bracket is already open.
    pub fn start_recording(&mut self) -> Result<()> {
        if self.recording {
            return Err(Error::RecordingState(
                "recording already in progress; brackets do not nest".to_string(),
            ));
        }
        debug!("recording bracket opened");
        self.graph = ComputeGraph::new();
        self.producers.clear();
        self.recording = true;
        Ok(())
    }

    /// Close the recording bracket and take the accumulated graph
    ///
    /// Fails with an invalid-state error when no bracket is open. The
    /// context's own graph is reset to empty.
    pub fn stop_recording(&mut self) -> Result<ComputeGraph> {
        if !self.recording {
            return Err(Error::RecordingState(
                "stop_recording without a matching start_recording".to_string(),
            ));
        }
        self.recording = false;
        self.producers.clear();
        let graph = std::mem::take(&mut self.graph);
        debug!(
            "recording bracket closed: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Read-only access to the graph accumulated so far
    pub fn graph(&self) -> &ComputeGraph {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut ComputeGraph {
        &mut self.graph
    }

    pub(crate) fn promotion_rules(&self) -> &dyn PromotionRules {
        self.promotions.as_ref()
    }

    pub(crate) fn capture_leaf_inputs_enabled(&self) -> bool {
        self.capture_leaf_inputs
    }

    pub(crate) fn producer(&self, id: TensorId) -> Option<&(String, usize)> {
        self.producers.get(&id)
    }

    pub(crate) fn register_producer(&mut self, id: TensorId, node: String, port: usize) {
        self.producers.insert(id, (node, port));
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("mode", &self.mode)
            .field("recording", &self.recording)
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .finish()
    }
}
