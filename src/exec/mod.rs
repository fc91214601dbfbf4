//! Execution layer: context state machine and the recording wrapper
//!
//! [`ExecutionContext`] carries the mode/recording state machine and the
//! graph being accumulated; [`GraphTensorOps`] wraps a base numeric provider
//! and mirrors its calls into that graph while a bracket is open.

mod context;
mod graph_ops;

pub use context::{ExecutionContext, ExecutionMode};
pub use graph_ops::GraphTensorOps;
