//! TensorData: Dense, View, and Broadcast tensor variants
//!
//! `TensorData` is a closed sum over the three storage models:
//!
//! - [`DenseData`] owns a flat contiguous buffer (offset 0, always contiguous)
//! - [`ViewData`] aliases a parent's buffer through explicit
//!   shape/strides/offset; zero-copy, possibly non-contiguous
//! - [`BroadcastData`] virtually expands a source to a larger shape via
//!   zero strides; read-oriented
//!
//! Views and broadcasts hold a shared, reference-counted handle to the
//! backing buffer (see [`Storage`]): a back-reference, never an ownership
//! transfer. `materialize` decouples any variant into an independent Dense
//! copy.

use super::iter::IndexIter;
use super::shape::Shape;
use super::slice::Slice;
use super::storage::Storage;
use super::strides::Strides;
use super::TensorId;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use rand::Rng;
use rand_distr::StandardNormal;
use std::fmt;

/// Dense tensor: owns a flat contiguous row-major buffer
#[derive(Debug)]
pub struct DenseData<T: Element> {
    id: TensorId,
    storage: Storage<T>,
    shape: Shape,
}

/// View tensor: aliases a window of a parent buffer
///
/// Holds a shared handle into the parent's storage plus explicit shape,
/// strides, and offset, and the parent's shape for bounds diagnostics.
/// The parent buffer stays alive while the view exists.
#[derive(Debug)]
pub struct ViewData<T: Element> {
    id: TensorId,
    storage: Storage<T>,
    shape: Shape,
    strides: Strides,
    offset: usize,
    parent_shape: Shape,
}

/// Broadcast tensor: virtual expansion of a source to a larger shape
///
/// Per-dimension reads along broadcast dimensions hit the same source
/// element. Writes are not meaningful and are rejected.
pub struct BroadcastData<T: Element> {
    id: TensorId,
    source: Box<TensorData<T>>,
    shape: Shape,
}

/// A tensor in any of the three storage models
pub enum TensorData<T: Element> {
    /// Owns contiguous storage
    Dense(DenseData<T>),
    /// Aliases a parent buffer
    View(ViewData<T>),
    /// Virtual zero-stride expansion
    Broadcast(BroadcastData<T>),
}

// ===== DenseData =====

impl<T: Element> DenseData<T> {
    /// Create a dense tensor from an existing buffer
    ///
    /// Fails when `data.len()` does not equal the shape's volume.
    pub fn from_vec(data: Vec<T>, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        if data.len() != shape.volume() {
            return Err(Error::shape_mismatch(shape.as_slice(), &[data.len()]));
        }
        Ok(Self {
            id: TensorId::new(),
            storage: Storage::from_vec(data),
            shape,
        })
    }

    /// Create a dense tensor filled with zeros
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let data = vec![T::zero(); shape.volume()];
        Self {
            id: TensorId::new(),
            storage: Storage::from_vec(data),
            shape,
        }
    }

    /// Create a dense tensor filled with ones
    pub fn ones(shape: impl Into<Shape>) -> Self {
        Self::full(shape, T::one())
    }

    /// Create a dense tensor filled with a scalar value
    pub fn full(shape: impl Into<Shape>, value: T) -> Self {
        let shape = shape.into();
        let data = vec![value; shape.volume()];
        Self {
            id: TensorId::new(),
            storage: Storage::from_vec(data),
            shape,
        }
    }

    /// Create a dense tensor with standard-normal samples
    pub fn randn(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let mut rng = rand::thread_rng();
        let data = (0..shape.volume())
            .map(|_| T::from_f64(rng.sample(StandardNormal)))
            .collect();
        Self {
            id: TensorId::new(),
            storage: Storage::from_vec(data),
            shape,
        }
    }

    /// Create a dense tensor with uniform samples in `[low, high)`
    pub fn uniform(shape: impl Into<Shape>, low: f64, high: f64) -> Result<Self> {
        if !(low < high) {
            return Err(Error::invalid_argument(
                "low",
                format!("uniform bounds must satisfy low < high, got [{}, {})", low, high),
            ));
        }
        let shape = shape.into();
        let mut rng = rand::thread_rng();
        let data = (0..shape.volume())
            .map(|_| T::from_f64(rng.gen_range(low..high)))
            .collect();
        Ok(Self {
            id: TensorId::new(),
            storage: Storage::from_vec(data),
            shape,
        })
    }

    /// Shape of this tensor
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Shared handle to the backing buffer
    #[inline]
    pub fn storage(&self) -> &Storage<T> {
        &self.storage
    }

    /// Element at a full index tuple, O(1)
    pub fn get(&self, indices: &[usize]) -> Result<T> {
        let flat = self.shape.index(indices)?;
        Ok(self.storage.read()[flat])
    }

    /// Write an element at a full index tuple, O(1)
    pub fn set(&self, indices: &[usize], value: T) -> Result<()> {
        let flat = self.shape.index(indices)?;
        self.storage.write()[flat] = value;
        Ok(())
    }

    /// Copy of the backing buffer in row-major order
    pub fn to_vec(&self) -> Vec<T> {
        self.storage.read().clone()
    }
}

// ===== ViewData =====

impl<T: Element> ViewData<T> {
    /// Create a view over `storage` with explicit layout
    ///
    /// Validates that every valid index tuple maps inside the backing extent
    /// before the view is constructed; a failing check produces no object.
    pub fn new(
        storage: Storage<T>,
        shape: Shape,
        strides: Strides,
        offset: usize,
        parent_shape: Shape,
    ) -> Result<Self> {
        if shape.rank() != strides.len() {
            return Err(Error::RankMismatch {
                rank: shape.rank(),
                got: strides.len(),
            });
        }

        // Extreme reachable flat offsets over the whole index space
        let mut lo = offset as isize;
        let mut hi = offset as isize;
        let mut has_elements = true;
        for (&dim, &stride) in shape.iter().zip(strides.iter()) {
            if dim == 0 {
                has_elements = false;
                break;
            }
            let span = (dim as isize - 1) * stride;
            if span < 0 {
                lo += span;
            } else {
                hi += span;
            }
        }
        let len = storage.len() as isize;
        if has_elements && (lo < 0 || hi >= len) {
            return Err(Error::invalid_argument(
                "offset",
                format!(
                    "view reaches flat offsets [{}, {}] outside parent extent {}",
                    lo, hi, len
                ),
            ));
        }

        Ok(Self {
            id: TensorId::new(),
            storage,
            shape,
            strides,
            offset,
            parent_shape,
        })
    }

    /// Shape of this view
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Per-dimension element strides
    #[inline]
    pub fn strides(&self) -> &Strides {
        &self.strides
    }

    /// Starting element offset into the parent buffer
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Shape of the parent this view was built from
    #[inline]
    pub fn parent_shape(&self) -> &Shape {
        &self.parent_shape
    }

    /// Shared handle to the parent's backing buffer
    #[inline]
    pub fn storage(&self) -> &Storage<T> {
        &self.storage
    }

    /// Whether this view reads the buffer in row-major order from offset 0
    pub fn is_contiguous(&self) -> bool {
        self.offset == 0 && self.strides == self.shape.contiguous_strides()
    }

    fn flat_offset(&self, indices: &[usize]) -> Result<usize> {
        self.shape.check_bounds(indices)?;
        let mut flat = self.offset as isize;
        for (&idx, &stride) in indices.iter().zip(self.strides.iter()) {
            flat += idx as isize * stride;
        }
        // Construction already bounded the reachable extent
        debug_assert!(flat >= 0 && (flat as usize) < self.storage.len());
        Ok(flat as usize)
    }

    /// Element at a full index tuple through the view's layout
    pub fn get(&self, indices: &[usize]) -> Result<T> {
        let flat = self.flat_offset(indices)?;
        Ok(self.storage.read()[flat])
    }

    /// Write an element through the view into the parent buffer
    pub fn set(&self, indices: &[usize], value: T) -> Result<()> {
        let flat = self.flat_offset(indices)?;
        self.storage.write()[flat] = value;
        Ok(())
    }
}

// ===== BroadcastData =====

impl<T: Element> BroadcastData<T> {
    /// Broadcast `source` to `target_shape`
    ///
    /// Validates the right-aligned rule (trailing dimensions equal, or the
    /// source dimension is 1) before construction; incompatible shapes fail
    /// with an invalid-argument error and no object is created.
    pub fn new(source: TensorData<T>, target_shape: impl Into<Shape>) -> Result<Self> {
        let target_shape = target_shape.into();
        if !source.shape().can_broadcast_to(&target_shape) {
            return Err(Error::broadcast(
                source.shape().as_slice(),
                target_shape.as_slice(),
            ));
        }
        Ok(Self {
            id: TensorId::new(),
            source: Box::new(source),
            shape: target_shape,
        })
    }

    /// Target shape of the expansion
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The wrapped source tensor
    #[inline]
    pub fn source(&self) -> &TensorData<T> {
        &self.source
    }

    /// Element at a full index tuple of the target shape
    ///
    /// Indices along broadcast dimensions are zeroed before delegating to the
    /// source.
    pub fn get(&self, indices: &[usize]) -> Result<T> {
        self.shape.check_bounds(indices)?;
        let src_shape = self.source.shape();
        let pad = self.shape.rank() - src_shape.rank();
        let src_indices: Vec<usize> = src_shape
            .iter()
            .zip(indices[pad..].iter())
            .map(|(&s, &i)| if s == 1 { 0 } else { i })
            .collect();
        self.source.get(&src_indices)
    }
}

// ===== TensorData dispatch =====

impl<T: Element> TensorData<T> {
    /// Dense tensor from an existing buffer
    pub fn from_vec(data: Vec<T>, shape: impl Into<Shape>) -> Result<Self> {
        Ok(TensorData::Dense(DenseData::from_vec(data, shape)?))
    }

    /// Dense tensor of zeros
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        TensorData::Dense(DenseData::zeros(shape))
    }

    /// Dense tensor of ones
    pub fn ones(shape: impl Into<Shape>) -> Self {
        TensorData::Dense(DenseData::ones(shape))
    }

    /// Dense tensor filled with `value`
    pub fn full(shape: impl Into<Shape>, value: T) -> Self {
        TensorData::Dense(DenseData::full(shape, value))
    }

    /// Broadcast this tensor to a larger target shape (zero-copy)
    pub fn broadcast_to(self, target_shape: impl Into<Shape>) -> Result<Self> {
        Ok(TensorData::Broadcast(BroadcastData::new(self, target_shape)?))
    }

    /// Stable identity of this tensor, used for producer deduplication
    pub fn id(&self) -> TensorId {
        match self {
            TensorData::Dense(d) => d.id,
            TensorData::View(v) => v.id,
            TensorData::Broadcast(b) => b.id,
        }
    }

    /// Shape of the tensor
    pub fn shape(&self) -> &Shape {
        match self {
            TensorData::Dense(d) => d.shape(),
            TensorData::View(v) => v.shape(),
            TensorData::Broadcast(b) => b.shape(),
        }
    }

    /// Element type of the tensor
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Rank (number of dimensions)
    pub fn rank(&self) -> usize {
        self.shape().rank()
    }

    /// Total number of elements
    pub fn volume(&self) -> usize {
        self.shape().volume()
    }

    /// Element at a full index tuple
    pub fn get(&self, indices: &[usize]) -> Result<T> {
        match self {
            TensorData::Dense(d) => d.get(indices),
            TensorData::View(v) => v.get(indices),
            TensorData::Broadcast(b) => b.get(indices),
        }
    }

    /// Write an element at a full index tuple
    ///
    /// Broadcast tensors are read-oriented; writing through one is rejected.
    pub fn set(&self, indices: &[usize], value: T) -> Result<()> {
        match self {
            TensorData::Dense(d) => d.set(indices, value),
            TensorData::View(v) => v.set(indices, value),
            TensorData::Broadcast(_) => Err(Error::unsupported(
                "set",
                "broadcast tensors are read-only",
            )),
        }
    }

    /// Whether elements are laid out contiguously in row-major order
    pub fn is_contiguous(&self) -> bool {
        match self {
            TensorData::Dense(_) => true,
            TensorData::View(v) => v.is_contiguous(),
            TensorData::Broadcast(_) => false,
        }
    }

    /// Build a zero-copy view by applying one slice descriptor per dimension
    ///
    /// Requires exactly `rank` descriptors. Chained slices compose
    /// associatively with no copies. Slicing a Broadcast materializes it
    /// first (there is no backing buffer to alias).
    pub fn slice(&self, slices: &[Slice]) -> Result<TensorData<T>> {
        match self {
            TensorData::Dense(d) => compose_view(
                d.storage.clone(),
                d.shape(),
                &d.shape().contiguous_strides(),
                0,
                d.shape().clone(),
                slices,
            ),
            TensorData::View(v) => compose_view(
                v.storage.clone(),
                v.shape(),
                v.strides(),
                v.offset(),
                v.parent_shape().clone(),
                slices,
            ),
            TensorData::Broadcast(_) => {
                let dense = self.materialize()?;
                let sliced = TensorData::Dense(dense).slice(slices)?;
                // The temporary Dense owns the buffer the view aliases;
                // returning the view keeps the buffer alive via Storage.
                Ok(sliced)
            }
        }
    }

    /// Copy the logical contents, in row-major order, into `dest`
    ///
    /// Walks the logical index space respecting strides and virtual
    /// expansion. Fails if `dest` cannot hold `volume` elements starting at
    /// `dest_offset`.
    pub fn copy_to(&self, dest: &mut [T], dest_offset: usize) -> Result<()> {
        let volume = self.volume();
        if dest_offset + volume > dest.len() {
            return Err(Error::invalid_argument(
                "dest_offset",
                format!(
                    "destination holds {} elements, need {} from offset {}",
                    dest.len(),
                    volume,
                    dest_offset
                ),
            ));
        }
        for (i, indices) in IndexIter::new(self.shape()).enumerate() {
            dest[dest_offset + i] = self.get(&indices)?;
        }
        Ok(())
    }

    /// Produce an independent, contiguous Dense copy of the logical contents
    ///
    /// The result owns fresh storage; the original parent (if any) is no
    /// longer needed for the copy's lifetime.
    pub fn materialize(&self) -> Result<DenseData<T>> {
        let mut data = vec![T::zero(); self.volume()];
        self.copy_to(&mut data, 0)?;
        DenseData::from_vec(data, self.shape().clone())
    }

    /// Logical contents as a row-major Vec
    pub fn to_vec(&self) -> Result<Vec<T>> {
        let mut data = vec![T::zero(); self.volume()];
        self.copy_to(&mut data, 0)?;
        Ok(data)
    }
}

/// Apply one slice descriptor per dimension over an existing layout
///
/// Per-dimension outputs (size, stride multiplier, offset contribution) are
/// combined independently, which is what makes chains of slices compose
/// associatively.
fn compose_view<T: Element>(
    storage: Storage<T>,
    shape: &Shape,
    strides: &Strides,
    offset: usize,
    parent_shape: Shape,
    slices: &[Slice],
) -> Result<TensorData<T>> {
    if slices.len() != shape.rank() {
        return Err(Error::RankMismatch {
            rank: shape.rank(),
            got: slices.len(),
        });
    }

    let mut new_shape = Vec::with_capacity(shape.rank());
    let mut new_strides = Vec::with_capacity(shape.rank());
    let mut new_offset = offset as isize;

    for ((&dim, &stride), slice) in shape.iter().zip(strides.iter()).zip(slices.iter()) {
        match slice.normalize(dim)? {
            Slice::All => {
                new_shape.push(dim);
                new_strides.push(stride);
            }
            Slice::At(index) => {
                new_offset += index * stride;
            }
            Slice::Range { start, end } => {
                new_offset += start * stride;
                new_shape.push((end - start) as usize);
                new_strides.push(stride);
            }
            Slice::Step { start, end, step } => {
                let (span, magnitude) = if step > 0 {
                    (end - start, step)
                } else {
                    (start - end, -step)
                };
                let size = (span as usize).div_ceil(magnitude as usize);
                // An empty window contributes no offset; its normalized
                // start may sit outside the dimension
                if size > 0 {
                    new_offset += start * stride;
                }
                new_shape.push(size);
                new_strides.push(stride * step);
            }
        }
    }

    if new_offset < 0 {
        return Err(Error::invalid_argument(
            "slices",
            "composed view offset is negative",
        ));
    }

    let view = ViewData::new(
        storage,
        Shape::from(new_shape),
        Strides::from(new_strides),
        new_offset as usize,
        parent_shape,
    )?;
    Ok(TensorData::View(view))
}

impl<T: Element> Clone for TensorData<T> {
    /// Clone shares storage for Dense/View and re-wraps the source for
    /// Broadcast; a fresh identity is assigned either way
    fn clone(&self) -> Self {
        match self {
            TensorData::Dense(d) => TensorData::Dense(DenseData {
                id: TensorId::new(),
                storage: d.storage.clone(),
                shape: d.shape.clone(),
            }),
            TensorData::View(v) => TensorData::View(ViewData {
                id: TensorId::new(),
                storage: v.storage.clone(),
                shape: v.shape.clone(),
                strides: v.strides.clone(),
                offset: v.offset,
                parent_shape: v.parent_shape.clone(),
            }),
            TensorData::Broadcast(b) => TensorData::Broadcast(BroadcastData {
                id: TensorId::new(),
                source: b.source.clone(),
                shape: b.shape.clone(),
            }),
        }
    }
}

impl<T: Element> fmt::Debug for TensorData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            TensorData::Dense(_) => "Dense",
            TensorData::View(_) => "View",
            TensorData::Broadcast(_) => "Broadcast",
        };
        f.debug_struct("TensorData")
            .field("variant", &variant)
            .field("id", &self.id())
            .field("shape", self.shape())
            .field("dtype", &self.dtype())
            .field("contiguous", &self.is_contiguous())
            .finish()
    }
}
