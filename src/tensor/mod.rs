//! Tensor memory and view model
//!
//! This module provides the storage side of the core: shapes and strides,
//! the shared buffer type, slice descriptors, and the three `TensorData`
//! variants (Dense, View, Broadcast) with materialization.

mod data;
mod id;
mod iter;
mod shape;
mod slice;
mod storage;
mod strides;

pub use data::{BroadcastData, DenseData, TensorData, ViewData};
pub use id::TensorId;
pub use iter::IndexIter;
pub use shape::{broadcast_shapes, Shape};
pub use slice::Slice;
pub use storage::Storage;
pub use strides::Strides;
