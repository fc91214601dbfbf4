//! Tensor operations
//!
//! This module defines the `TensorOps` provider trait - the numeric engine
//! the core consumes - and a naive loop-based reference provider.
//!
//! # Design
//!
//! The core never implements the numeric math itself; it wraps whichever
//! `TensorOps` implementation it is given. The recording layer
//! (`exec::GraphTensorOps`) delegates every call to the base provider and,
//! when a recording bracket is open, mirrors the call into a `ComputeGraph`.
//!
//! ```text
//! GraphTensorOps<O>
//!   └── wraps O: TensorOps<T>
//!         ├── add, sub, mul, div      (binary arithmetic)
//!         ├── matmul                  (matrix multiplication)
//!         ├── transpose, reshape, ... (shape/view operations)
//!         ├── relu, sigmoid, softmax  (activations)
//!         ├── conv2d, max_pool2d      (spatial operations)
//!         ├── sum, mean, variance     (reductions)
//!         └── sqrt, convert           (unary / conversion)
//! ```

mod reference;

pub use reference::NaiveOps;

use crate::dtype::{DType, Element};
use crate::error::Result;
use crate::tensor::TensorData;

/// The numeric engine consumed by the core
///
/// Implementations are free to compute however they like; the core treats
/// them as an opaque black box. All operations are eager: they compute and
/// return before the caller continues.
pub trait TensorOps<T: Element> {
    // ===== Element-wise Binary Operations =====

    /// Element-wise addition: a + b (broadcasting)
    fn add(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>>;

    /// Element-wise subtraction: a - b (broadcasting)
    fn sub(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>>;

    /// Element-wise multiplication: a * b (broadcasting)
    fn mul(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>>;

    /// Element-wise division: a / b (broadcasting)
    fn div(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>>;

    // ===== Matrix Multiplication =====

    /// 2-D matrix multiplication: `[m, k] x [k, n] -> [m, n]`
    fn matmul(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>>;

    // ===== Shape / View Operations =====

    /// Swap two dimensions (negative indices count from the end)
    fn transpose(&self, a: &TensorData<T>, dim0: isize, dim1: isize) -> Result<TensorData<T>>;

    /// Reshape, preserving row-major element order
    ///
    /// At most one target dimension may be `-1`; it is inferred from the
    /// volume.
    fn reshape(&self, a: &TensorData<T>, shape: &[isize]) -> Result<TensorData<T>>;

    /// Flatten to one dimension
    fn flatten(&self, a: &TensorData<T>) -> Result<TensorData<T>>;

    /// Remove dimensions of size 1 (all of them, or one specific dimension)
    fn squeeze(&self, a: &TensorData<T>, dim: Option<isize>) -> Result<TensorData<T>>;

    /// Insert a dimension of size 1 at `dim`
    fn unsqueeze(&self, a: &TensorData<T>, dim: isize) -> Result<TensorData<T>>;

    /// Concatenate tensors along `dim`
    fn concat(&self, tensors: &[&TensorData<T>], dim: isize) -> Result<TensorData<T>>;

    /// Split along `dim` into consecutive chunks of the given sizes
    ///
    /// The chunk sizes must sum to the dimension's size. Results are
    /// zero-copy views where the input has backing storage.
    fn split(&self, a: &TensorData<T>, sizes: &[usize], dim: isize)
        -> Result<Vec<TensorData<T>>>;

    // ===== Activations =====

    /// Rectified linear unit: max(x, 0)
    fn relu(&self, a: &TensorData<T>) -> Result<TensorData<T>>;

    /// Logistic sigmoid: 1 / (1 + e^-x)
    fn sigmoid(&self, a: &TensorData<T>) -> Result<TensorData<T>>;

    /// Softmax along `dim` (numerically stabilized)
    fn softmax(&self, a: &TensorData<T>, dim: isize) -> Result<TensorData<T>>;

    // ===== Spatial Operations =====

    /// 2-D convolution over `[N, C, H, W]` input with `[O, C, KH, KW]` kernel
    fn conv2d(
        &self,
        input: &TensorData<T>,
        kernel: &TensorData<T>,
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<TensorData<T>>;

    /// 2-D max pooling over `[N, C, H, W]` input
    fn max_pool2d(
        &self,
        input: &TensorData<T>,
        kernel: (usize, usize),
        stride: (usize, usize),
    ) -> Result<TensorData<T>>;

    // ===== Reductions =====

    /// Sum over all elements (`dim = None`) or along one dimension
    fn sum(&self, a: &TensorData<T>, dim: Option<isize>) -> Result<TensorData<T>>;

    /// Arithmetic mean over all elements or along one dimension
    fn mean(&self, a: &TensorData<T>, dim: Option<isize>) -> Result<TensorData<T>>;

    /// Population variance over all elements or along one dimension
    fn variance(&self, a: &TensorData<T>, dim: Option<isize>) -> Result<TensorData<T>>;

    // ===== Unary / Conversion =====

    /// Element-wise square root
    fn sqrt(&self, a: &TensorData<T>) -> Result<TensorData<T>>;

    /// Round every element through the value grid of `dtype`
    ///
    /// The storage element type stays `T`; cross-type storage conversion
    /// belongs to the hosting toolkit.
    fn convert(&self, a: &TensorData<T>, dtype: DType) -> Result<TensorData<T>>;
}
