//! # tensr
//!
//! **Tensor memory model and compute-graph recording core.**
//!
//! tensr provides the storage side of a tensor toolkit: shapes with row-major
//! strides, zero-copy views and broadcasts over shared buffers, and a
//! compute-graph layer that records eagerly executed operations into an
//! inspectable DAG.
//!
//! ## Design
//!
//! - **Closed data model**: [`tensor::TensorData`] is a sum over Dense, View,
//!   and Broadcast; every consumer matches exhaustively, so adding a variant
//!   is a deliberate, compiler-checked event
//! - **Zero-copy aliasing**: views and broadcasts hold reference-counted
//!   handles to the parent buffer, never copies; `materialize` decouples
//! - **Eager always**: the numeric provider ([`ops::TensorOps`]) computes
//!   immediately; graph mode only records structure on the side
//! - **Explicit context**: recording state lives in an
//!   [`exec::ExecutionContext`] passed to every call, never in a global
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tensr::prelude::*;
//!
//! let ops = GraphTensorOps::new(NaiveOps::new());
//! let mut ctx = ExecutionContext::new();
//!
//! let a = TensorData::<f32>::ones([2, 3]);
//! let b = TensorData::<f32>::ones([2, 3]);
//!
//! ctx.start_recording()?;
//! let c = ops.add(&mut ctx, &a, &b)?;   // computed eagerly AND recorded
//! let graph = ctx.stop_recording()?;
//!
//! assert_eq!(c.get(&[0, 0])?, 2.0);
//! assert_eq!(graph.node_count(), 1);
//! ```
//!
//! ## Out of scope
//!
//! Autograd, GPU execution, serialization, and neural-net layers belong to
//! the hosting toolkit; tensr stops at storage, views, and graph structure.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod dtype;
pub mod error;
pub mod exec;
pub mod graph;
pub mod ops;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Element, PromotionRules, StrictPromotion};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::exec::{ExecutionContext, ExecutionMode, GraphTensorOps};
    pub use crate::graph::{ComputeGraph, GraphEdge, GraphNode, Operation, TensorSpec, Validation};
    pub use crate::ops::{NaiveOps, TensorOps};
    pub use crate::tensor::{Shape, Slice, TensorData};
}
