//! Shape type: dimensions of a tensor

use super::strides::Strides;
use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;
use std::iter::FromIterator;
use std::ops::Deref;

/// Stack allocation threshold for dimensions
/// Most tensors have 4 or fewer dimensions, so we stack-allocate up to 4
pub(crate) const STACK_DIMS: usize = 4;

/// Shape type: ordered dimension sizes of a tensor
///
/// Immutable once constructed. `volume` is the product of all dimensions
/// (1 for the empty/scalar shape); default strides are row-major with the
/// last dimension varying fastest.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(SmallVec<[usize; STACK_DIMS]>);

impl Shape {
    /// Create a scalar (rank-0) shape
    pub fn scalar() -> Self {
        Self(SmallVec::new())
    }

    /// View shape as a slice
    pub fn as_slice(&self) -> &[usize] {
        self.0.as_slice()
    }

    /// Number of dimensions in this shape
    #[inline]
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements: product of all dimensions, 1 for rank 0
    #[inline]
    pub fn volume(&self) -> usize {
        self.0.iter().product()
    }

    /// Whether this is the scalar shape
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    /// Size along dimension `dim`
    #[inline]
    pub fn dim(&self, dim: usize) -> Option<usize> {
        self.0.get(dim).copied()
    }

    /// Row-major (C-order) strides for this shape
    ///
    /// The rightmost dimension has stride 1.
    pub fn contiguous_strides(&self) -> Strides {
        let mut strides = Strides::with_capacity(self.rank());
        let mut stride = 1isize;
        for &dim in self.0.iter().rev() {
            strides.push(stride);
            stride *= dim as isize;
        }
        strides.reverse();
        strides
    }

    /// Compute the flat row-major offset for a full index tuple
    ///
    /// Fails when `indices.len() != rank` or any index is outside its
    /// dimension.
    pub fn index(&self, indices: &[usize]) -> Result<usize> {
        self.check_bounds(indices)?;
        let strides = self.contiguous_strides();
        let mut linear = 0isize;
        for (&idx, &stride) in indices.iter().zip(strides.iter()) {
            linear += idx as isize * stride;
        }
        Ok(linear as usize)
    }

    /// Validate an index tuple against this shape without computing an offset
    pub fn check_bounds(&self, indices: &[usize]) -> Result<()> {
        if indices.len() != self.rank() {
            return Err(Error::RankMismatch {
                rank: self.rank(),
                got: indices.len(),
            });
        }
        for (dim, (&idx, &size)) in indices.iter().zip(self.0.iter()).enumerate() {
            if idx >= size {
                return Err(Error::IndexOutOfBounds {
                    index: idx,
                    dim,
                    size,
                });
            }
        }
        Ok(())
    }

    /// Check whether this shape can broadcast to `target`
    ///
    /// Standard right-aligned rule: trailing dimensions must be equal, or the
    /// source dimension must be 1. Missing leading source dimensions act as 1.
    pub fn can_broadcast_to(&self, target: &Shape) -> bool {
        if target.rank() < self.rank() {
            return false;
        }
        let pad = target.rank() - self.rank();
        self.0
            .iter()
            .zip(target.as_slice()[pad..].iter())
            .all(|(&s, &t)| s == t || s == 1)
    }

    /// Strides for reading this shape's data through a `target`-shaped window
    ///
    /// Broadcast dimensions (source dim == 1 or absent) get stride 0, so
    /// repeated reads hit the same source element. Fails when the shapes are
    /// not right-aligned compatible.
    pub fn broadcast_strides(&self, base: &Strides, target: &Shape) -> Result<Strides> {
        if !self.can_broadcast_to(target) {
            return Err(Error::broadcast(self.as_slice(), target.as_slice()));
        }
        debug_assert_eq!(base.len(), self.rank());
        let pad = target.rank() - self.rank();
        let mut strides = Strides::with_capacity(target.rank());
        for _ in 0..pad {
            strides.push(0);
        }
        for ((&s, &st), &t) in self
            .0
            .iter()
            .zip(base.iter())
            .zip(target.as_slice()[pad..].iter())
        {
            strides.push(if s == t { st } else { 0 });
        }
        Ok(strides)
    }

    /// Normalize a dimension index, resolving negative (from-the-end) values
    pub fn normalize_dim(&self, dim: isize) -> Result<usize> {
        let rank = self.rank() as isize;
        let idx = if dim < 0 { rank + dim } else { dim };
        if idx >= 0 && idx < rank {
            Ok(idx as usize)
        } else {
            Err(Error::invalid_argument(
                "dim",
                format!("dimension {} out of range for rank {}", dim, rank),
            ))
        }
    }

    /// Resolve a reshape target that may contain one inferred `-1` dimension
    ///
    /// Fails when more than one dimension is `-1`, when any other entry is
    /// negative, or when the target volume does not match this shape's volume.
    pub fn infer_reshape(&self, target: &[isize]) -> Result<Shape> {
        let mut inferred: Option<usize> = None;
        let mut known: usize = 1;
        for (pos, &d) in target.iter().enumerate() {
            if d == -1 {
                if inferred.is_some() {
                    return Err(Error::invalid_argument(
                        "shape",
                        "only one inferred dimension allowed",
                    ));
                }
                inferred = Some(pos);
            } else if d < 0 {
                return Err(Error::invalid_argument(
                    "shape",
                    format!("negative dimension {} at position {}", d, pos),
                ));
            } else {
                known *= d as usize;
            }
        }

        let volume = self.volume();
        let mut dims: SmallVec<[usize; STACK_DIMS]> =
            target.iter().map(|&d| d.max(0) as usize).collect();

        match inferred {
            Some(pos) => {
                if known == 0 || volume % known != 0 {
                    return Err(Error::shape_mismatch(self.as_slice(), &dims));
                }
                dims[pos] = volume / known;
            }
            None => {
                if known != volume {
                    return Err(Error::shape_mismatch(self.as_slice(), &dims));
                }
            }
        }
        Ok(Shape(dims))
    }
}

/// Compute the two-sided broadcast shape of two shapes
///
/// Right-aligned pairing; dimensions must be equal or one of them 1.
pub fn broadcast_shapes(a: &Shape, b: &Shape) -> Option<Shape> {
    let max_rank = a.rank().max(b.rank());
    let mut dims: SmallVec<[usize; STACK_DIMS]> = SmallVec::with_capacity(max_rank);

    for i in 0..max_rank {
        let a_dim = if i < a.rank() { a[a.rank() - 1 - i] } else { 1 };
        let b_dim = if i < b.rank() { b[b.rank() - 1 - i] } else { 1 };

        if a_dim == b_dim || b_dim == 1 {
            dims.push(a_dim);
        } else if a_dim == 1 {
            dims.push(b_dim);
        } else {
            return None;
        }
    }

    dims.reverse();
    Some(Shape(dims))
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<[usize]> for Shape {
    fn as_ref(&self) -> &[usize] {
        self.0.as_slice()
    }
}

impl From<Vec<usize>> for Shape {
    fn from(value: Vec<usize>) -> Self {
        Self(value.into_iter().collect())
    }
}

impl From<&[usize]> for Shape {
    fn from(value: &[usize]) -> Self {
        Self(value.iter().copied().collect())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(value: [usize; N]) -> Self {
        Self(value.into_iter().collect())
    }
}

impl FromIterator<usize> for Shape {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
