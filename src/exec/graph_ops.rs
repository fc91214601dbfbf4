//! Recording wrapper around a base `TensorOps` provider
//!
//! `GraphTensorOps` delegates every operation to the wrapped provider, so
//! results are always computed eagerly. When the passed context has a
//! recording bracket open, the call is additionally mirrored into the
//! context's graph: one node per operation, edges wired from whichever nodes
//! produced the operands earlier in the bracket.
//!
//! Producers are tracked by tensor identity (`TensorId`), never by name, so
//! two tensors that happen to share a shape or label are never conflated.

use super::context::ExecutionContext;
use crate::dtype::{DType, Element};
use crate::error::Result;
use crate::graph::{GraphEdge, GraphNode, Operation, TensorSpec};
use crate::ops::TensorOps;
use crate::tensor::TensorData;
use log::trace;
use std::sync::atomic::{AtomicU64, Ordering};

// Process-wide so ids stay unique across brackets and contexts
static NODE_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_node_id(op: &str) -> String {
    format!("{}_{}", op, NODE_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Wraps a numeric provider and mirrors calls into the context's graph
///
/// All methods take the `ExecutionContext` explicitly; the wrapper itself is
/// stateless apart from the base provider.
#[derive(Debug, Clone)]
pub struct GraphTensorOps<O> {
    base: O,
}

impl<O> GraphTensorOps<O> {
    /// Wrap a base provider
    pub fn new(base: O) -> Self {
        Self { base }
    }

    /// The wrapped provider
    pub fn base(&self) -> &O {
        &self.base
    }

    /// Unwrap, returning the base provider
    pub fn into_inner(self) -> O {
        self.base
    }
}

/// Mirror one completed operation into the context's graph
fn record<T: Element>(
    ctx: &mut ExecutionContext,
    operation: Operation,
    operands: &[&TensorData<T>],
    results: &[&TensorData<T>],
    output_dtype: DType,
) -> Result<()> {
    let node_id = next_node_id(&operation.name);

    let inputs: Vec<TensorSpec> = operands
        .iter()
        .map(|t| TensorSpec::new(t.id().to_string(), t.shape().clone(), t.dtype()))
        .collect();
    let outputs: Vec<TensorSpec> = results
        .iter()
        .enumerate()
        .map(|(port, t)| {
            TensorSpec::new(
                format!("{}_out{}", node_id, port),
                t.shape().clone(),
                output_dtype,
            )
        })
        .collect();

    // Dedicated producer nodes for unseen leaf operands, when enabled
    if ctx.capture_leaf_inputs_enabled() {
        for t in operands {
            if ctx.producer(t.id()).is_none() {
                let leaf_id = next_node_id("input");
                let spec = TensorSpec::new(t.id().to_string(), t.shape().clone(), t.dtype());
                let node =
                    GraphNode::new(leaf_id.clone(), Operation::new("input")).with_outputs(vec![spec]);
                trace!("recorded leaf node '{}'", leaf_id);
                ctx.graph_mut().add_node(node)?;
                ctx.register_producer(t.id(), leaf_id, 0);
            }
        }
    }

    let node = GraphNode::new(node_id.clone(), operation)
        .with_inputs(inputs.clone())
        .with_outputs(outputs);
    trace!("recorded node '{}'", node_id);
    ctx.graph_mut().add_node(node)?;

    for (port, t) in operands.iter().enumerate() {
        if let Some((source, source_port)) = ctx.producer(t.id()).cloned() {
            let edge = GraphEdge::new(
                format!("{}_in{}", node_id, port),
                source,
                node_id.clone(),
                source_port,
                port,
                inputs[port].clone(),
            );
            trace!("recorded edge '{}'", edge.id);
            ctx.graph_mut().add_edge(edge)?;
        }
    }

    for (port, t) in results.iter().enumerate() {
        ctx.register_producer(t.id(), node_id.clone(), port);
    }
    Ok(())
}

fn record_binary<T: Element>(
    ctx: &mut ExecutionContext,
    name: &str,
    a: &TensorData<T>,
    b: &TensorData<T>,
    out: &TensorData<T>,
) -> Result<()> {
    let dtype = ctx.promotion_rules().promote(a.dtype(), b.dtype())?;
    record(ctx, Operation::new(name), &[a, b], &[out], dtype)
}

fn record_unary<T: Element>(
    ctx: &mut ExecutionContext,
    operation: Operation,
    a: &TensorData<T>,
    out: &TensorData<T>,
) -> Result<()> {
    record(ctx, operation, &[a], &[out], a.dtype())
}

impl<O> GraphTensorOps<O> {
    // ===== Element-wise Binary Operations =====

    /// Element-wise addition, recorded as an `add` node
    pub fn add<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        b: &TensorData<T>,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.add(a, b)?;
        if ctx.is_recording() {
            record_binary(ctx, "add", a, b, &out)?;
        }
        Ok(out)
    }

    /// Element-wise subtraction, recorded as a `sub` node
    pub fn sub<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        b: &TensorData<T>,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.sub(a, b)?;
        if ctx.is_recording() {
            record_binary(ctx, "sub", a, b, &out)?;
        }
        Ok(out)
    }

    /// Element-wise multiplication, recorded as a `mul` node
    pub fn mul<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        b: &TensorData<T>,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.mul(a, b)?;
        if ctx.is_recording() {
            record_binary(ctx, "mul", a, b, &out)?;
        }
        Ok(out)
    }

    /// Element-wise division, recorded as a `div` node
    pub fn div<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        b: &TensorData<T>,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.div(a, b)?;
        if ctx.is_recording() {
            record_binary(ctx, "div", a, b, &out)?;
        }
        Ok(out)
    }

    // ===== Matrix Multiplication =====

    /// 2-D matrix multiplication, recorded as a `matmul` node
    pub fn matmul<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        b: &TensorData<T>,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.matmul(a, b)?;
        if ctx.is_recording() {
            record_binary(ctx, "matmul", a, b, &out)?;
        }
        Ok(out)
    }

    // ===== Shape / View Operations =====

    /// Dimension swap, recorded as a `transpose` node
    pub fn transpose<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        dim0: isize,
        dim1: isize,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.transpose(a, dim0, dim1)?;
        if ctx.is_recording() {
            let op = Operation::new("transpose")
                .with_param("dim0", dim0.to_string())
                .with_param("dim1", dim1.to_string());
            record_unary(ctx, op, a, &out)?;
        }
        Ok(out)
    }

    /// Reshape, recorded as a `reshape` node
    pub fn reshape<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        shape: &[isize],
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.reshape(a, shape)?;
        if ctx.is_recording() {
            let op = Operation::new("reshape").with_param("shape", format!("{:?}", shape));
            record_unary(ctx, op, a, &out)?;
        }
        Ok(out)
    }

    /// Flatten, recorded as a `flatten` node
    pub fn flatten<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.flatten(a)?;
        if ctx.is_recording() {
            record_unary(ctx, Operation::new("flatten"), a, &out)?;
        }
        Ok(out)
    }

    /// Squeeze, recorded as a `squeeze` node
    pub fn squeeze<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        dim: Option<isize>,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.squeeze(a, dim)?;
        if ctx.is_recording() {
            let mut op = Operation::new("squeeze");
            if let Some(d) = dim {
                op = op.with_param("dim", d.to_string());
            }
            record_unary(ctx, op, a, &out)?;
        }
        Ok(out)
    }

    /// Unsqueeze, recorded as an `unsqueeze` node
    pub fn unsqueeze<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        dim: isize,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.unsqueeze(a, dim)?;
        if ctx.is_recording() {
            let op = Operation::new("unsqueeze").with_param("dim", dim.to_string());
            record_unary(ctx, op, a, &out)?;
        }
        Ok(out)
    }

    /// Concatenation, recorded as a `concat` node with one input per operand
    pub fn concat<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        tensors: &[&TensorData<T>],
        dim: isize,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.concat(tensors, dim)?;
        if ctx.is_recording() {
            let op = Operation::new("concat").with_param("dim", dim.to_string());
            record(ctx, op, tensors, &[&out], out.dtype())?;
        }
        Ok(out)
    }

    /// Split, recorded as a `split` node with one output per chunk
    pub fn split<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        sizes: &[usize],
        dim: isize,
    ) -> Result<Vec<TensorData<T>>>
    where
        O: TensorOps<T>,
    {
        let chunks = self.base.split(a, sizes, dim)?;
        if ctx.is_recording() {
            let op = Operation::new("split")
                .with_param("sizes", format!("{:?}", sizes))
                .with_param("dim", dim.to_string());
            let results: Vec<&TensorData<T>> = chunks.iter().collect();
            record(ctx, op, &[a], &results, a.dtype())?;
        }
        Ok(chunks)
    }

    // ===== Activations =====

    /// ReLU, recorded as a `relu` node
    pub fn relu<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.relu(a)?;
        if ctx.is_recording() {
            record_unary(ctx, Operation::new("relu"), a, &out)?;
        }
        Ok(out)
    }

    /// Sigmoid, recorded as a `sigmoid` node
    pub fn sigmoid<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.sigmoid(a)?;
        if ctx.is_recording() {
            record_unary(ctx, Operation::new("sigmoid"), a, &out)?;
        }
        Ok(out)
    }

    /// Softmax, recorded as a `softmax` node
    pub fn softmax<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        dim: isize,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.softmax(a, dim)?;
        if ctx.is_recording() {
            let op = Operation::new("softmax").with_param("dim", dim.to_string());
            record_unary(ctx, op, a, &out)?;
        }
        Ok(out)
    }

    // ===== Spatial Operations =====

    /// 2-D convolution, recorded as a `conv2d` node
    pub fn conv2d<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        input: &TensorData<T>,
        kernel: &TensorData<T>,
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.conv2d(input, kernel, stride, padding)?;
        if ctx.is_recording() {
            let op = Operation::new("conv2d")
                .with_param("stride", format!("{:?}", stride))
                .with_param("padding", format!("{:?}", padding));
            record(ctx, op, &[input, kernel], &[&out], out.dtype())?;
        }
        Ok(out)
    }

    /// 2-D max pooling, recorded as a `max_pool2d` node
    pub fn max_pool2d<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        input: &TensorData<T>,
        kernel: (usize, usize),
        stride: (usize, usize),
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.max_pool2d(input, kernel, stride)?;
        if ctx.is_recording() {
            let op = Operation::new("max_pool2d")
                .with_param("kernel", format!("{:?}", kernel))
                .with_param("stride", format!("{:?}", stride));
            record_unary(ctx, op, input, &out)?;
        }
        Ok(out)
    }

    // ===== Reductions =====

    /// Sum reduction, recorded as a `sum` node
    pub fn sum<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        dim: Option<isize>,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.sum(a, dim)?;
        if ctx.is_recording() {
            record_unary(ctx, reduction_op("sum", dim), a, &out)?;
        }
        Ok(out)
    }

    /// Mean reduction, recorded as a `mean` node
    pub fn mean<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        dim: Option<isize>,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.mean(a, dim)?;
        if ctx.is_recording() {
            record_unary(ctx, reduction_op("mean", dim), a, &out)?;
        }
        Ok(out)
    }

    /// Variance reduction, recorded as a `variance` node
    pub fn variance<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        dim: Option<isize>,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.variance(a, dim)?;
        if ctx.is_recording() {
            record_unary(ctx, reduction_op("variance", dim), a, &out)?;
        }
        Ok(out)
    }

    // ===== Unary / Conversion =====

    /// Element-wise square root, recorded as a `sqrt` node
    pub fn sqrt<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.sqrt(a)?;
        if ctx.is_recording() {
            record_unary(ctx, Operation::new("sqrt"), a, &out)?;
        }
        Ok(out)
    }

    /// Value-grid conversion, recorded as a `convert` node
    pub fn convert<T: Element>(
        &self,
        ctx: &mut ExecutionContext,
        a: &TensorData<T>,
        dtype: DType,
    ) -> Result<TensorData<T>>
    where
        O: TensorOps<T>,
    {
        let out = self.base.convert(a, dtype)?;
        if ctx.is_recording() {
            let op = Operation::new("convert").with_param("dtype", dtype.to_string());
            record_unary(ctx, op, a, &out)?;
        }
        Ok(out)
    }
}

fn reduction_op(name: &str, dim: Option<isize>) -> Operation {
    let mut op = Operation::new(name);
    if let Some(d) = dim {
        op = op.with_param("dim", d.to_string());
    }
    op
}
