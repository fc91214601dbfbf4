//! Slice descriptors used to build zero-copy views
//!
//! One descriptor applies to one dimension. Each variant validates and
//! transforms its dimension independently; the view-construction algorithm in
//! `tensor::data` combines the per-dimension outputs into the final
//! shape/strides/offset.

use crate::error::{Error, Result};

/// Per-dimension slice descriptor
///
/// A closed sum type, matched exhaustively at every consumption site.
/// `At` reduces the rank of the result by one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slice {
    /// Half-open index window `[start, end)`
    Range {
        /// Start index (negative counts from the end)
        start: isize,
        /// End index, exclusive (negative counts from the end)
        end: isize,
    },
    /// A single index; removes the dimension from the result
    At(isize),
    /// The whole dimension, unchanged
    All,
    /// Strided half-open window `[start, end)` advancing by `step`
    Step {
        /// Start index (negative counts from the end)
        start: isize,
        /// End index, exclusive (negative counts from the end)
        end: isize,
        /// Step between taken indices; non-zero, negative traverses in
        /// reverse from `start` down toward `end`
        step: isize,
    },
}

impl Slice {
    /// `[start, end)` window
    pub fn range(start: isize, end: isize) -> Self {
        Slice::Range { start, end }
    }

    /// Single index, reducing rank
    pub fn at(index: isize) -> Self {
        Slice::At(index)
    }

    /// Whole dimension
    pub fn all() -> Self {
        Slice::All
    }

    /// `[start, end)` window advancing by `step`
    pub fn step(start: isize, end: isize, step: isize) -> Self {
        Slice::Step { start, end, step }
    }

    /// Resolve negative indices and clamp window ends to the dimension
    ///
    /// Negative indices are Python-style (`-1` is the last element). For a
    /// forward window, ends are clamped into `[0, dim_size]` and the result
    /// holds only non-negative values. For a negative step the window runs
    /// from `start` down toward `end` (exclusive); both are clamped into
    /// `[-1, dim_size - 1]`, where a resolved `-1` end means "past the first
    /// element". Fails with an invalid-argument error on windows inverted
    /// against the step direction, out-of-range `At`, or a zero step.
    pub fn normalize(&self, dim_size: usize) -> Result<Slice> {
        let dim = dim_size as isize;
        let resolve_clamped = |i: isize| -> isize {
            let i = if i < 0 { i + dim } else { i };
            i.clamp(0, dim)
        };

        match *self {
            Slice::All => Ok(Slice::All),
            Slice::At(index) => {
                let resolved = if index < 0 { index + dim } else { index };
                if resolved < 0 || resolved >= dim {
                    return Err(Error::invalid_slice(
                        dim_size,
                        format!("index {} out of range", index),
                    ));
                }
                Ok(Slice::At(resolved))
            }
            Slice::Range { start, end } => {
                let start = resolve_clamped(start);
                let end = resolve_clamped(end);
                if start > end {
                    return Err(Error::invalid_slice(
                        dim_size,
                        format!("start {} exceeds end {}", start, end),
                    ));
                }
                Ok(Slice::Range { start, end })
            }
            Slice::Step { start, end, step } => {
                if step == 0 {
                    return Err(Error::invalid_slice(dim_size, "step must be non-zero"));
                }
                if step > 0 {
                    let start = resolve_clamped(start);
                    let end = resolve_clamped(end);
                    if start > end {
                        return Err(Error::invalid_slice(
                            dim_size,
                            format!("start {} exceeds end {}", start, end),
                        ));
                    }
                    Ok(Slice::Step { start, end, step })
                } else {
                    // Descending window; a resolved end of -1 stops past
                    // index 0
                    let resolve_descending = |i: isize| -> isize {
                        let i = if i < 0 { i + dim } else { i };
                        i.clamp(-1, dim - 1)
                    };
                    let start = resolve_descending(start);
                    let end = resolve_descending(end);
                    if start < end {
                        return Err(Error::invalid_slice(
                            dim_size,
                            format!("start {} below end {} for negative step", start, end),
                        ));
                    }
                    Ok(Slice::Step { start, end, step })
                }
            }
        }
    }

    /// Whether `normalize(dim_size)` would succeed
    pub fn is_valid(&self, dim_size: usize) -> bool {
        self.normalize(dim_size).is_ok()
    }

    /// Whether the selected elements are adjacent in the source dimension
    pub fn is_contiguous(&self) -> bool {
        match *self {
            Slice::All | Slice::Range { .. } | Slice::At(_) => true,
            Slice::Step { step, .. } => step == 1,
        }
    }

    /// Whether this descriptor multiplies the dimension's stride
    pub fn has_non_trivial_stride(&self) -> bool {
        matches!(*self, Slice::Step { step, .. } if step != 1)
    }

    /// Whether the descriptor selects no elements from a dimension of
    /// `dim_size`
    ///
    /// Judged after normalization, so negative bounds resolve before the
    /// window is measured. Descriptors that fail to normalize are not empty,
    /// they are invalid.
    pub fn is_empty(&self, dim_size: usize) -> bool {
        matches!(self.result_size(dim_size), Ok(0))
    }

    /// Number of elements selected from a dimension of `dim_size`
    pub fn result_size(&self, dim_size: usize) -> Result<usize> {
        match self.normalize(dim_size)? {
            Slice::All => Ok(dim_size),
            Slice::At(_) => Ok(1),
            Slice::Range { start, end } => Ok((end - start) as usize),
            Slice::Step { start, end, step } => {
                let (span, stride) = if step > 0 {
                    (end - start, step)
                } else {
                    (start - end, -step)
                };
                Ok((span as usize).div_ceil(stride as usize))
            }
        }
    }

    /// Whether the dimension survives in the result (`At` drops it)
    pub fn keeps_dim(&self) -> bool {
        !matches!(self, Slice::At(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_negative_indices() {
        assert_eq!(
            Slice::range(-3, -1).normalize(5).unwrap(),
            Slice::range(2, 4)
        );
        assert_eq!(Slice::at(-1).normalize(5).unwrap(), Slice::at(4));
        assert_eq!(
            Slice::step(-4, 5, 2).normalize(5).unwrap(),
            Slice::step(1, 5, 2)
        );
    }

    #[test]
    fn test_normalize_clamps_out_of_range() {
        assert_eq!(
            Slice::range(0, 100).normalize(5).unwrap(),
            Slice::range(0, 5)
        );
        assert_eq!(
            Slice::range(-100, 3).normalize(5).unwrap(),
            Slice::range(0, 3)
        );
    }

    #[test]
    fn test_normalize_rejects_malformed() {
        assert!(Slice::range(3, 1).normalize(5).is_err());
        assert!(Slice::at(5).normalize(5).is_err());
        assert!(Slice::at(-6).normalize(5).is_err());
        assert!(Slice::step(0, 5, 0).normalize(5).is_err());
        // Ascending window against a descending step
        assert!(Slice::step(0, 5, -2).normalize(5).is_err());
    }

    #[test]
    fn test_normalize_negative_step() {
        // Full reversal: start at the last element, stop past the first
        assert_eq!(
            Slice::step(4, -6, -1).normalize(5).unwrap(),
            Slice::step(4, -1, -1)
        );
        assert_eq!(
            Slice::step(-1, 0, -2).normalize(5).unwrap(),
            Slice::step(4, 0, -2)
        );
        // Start clamps down to the last element
        assert_eq!(
            Slice::step(100, -6, -1).normalize(5).unwrap(),
            Slice::step(4, -1, -1)
        );
    }

    #[test]
    fn test_result_size() {
        assert_eq!(Slice::all().result_size(7).unwrap(), 7);
        assert_eq!(Slice::at(3).result_size(7).unwrap(), 1);
        assert_eq!(Slice::range(1, 5).result_size(7).unwrap(), 4);
        assert_eq!(Slice::step(0, 7, 2).result_size(7).unwrap(), 4);
        assert_eq!(Slice::step(0, 7, 3).result_size(7).unwrap(), 3);
        assert_eq!(Slice::range(2, 2).result_size(7).unwrap(), 0);
    }

    #[test]
    fn test_result_size_negative_step() {
        assert_eq!(Slice::step(6, -8, -1).result_size(7).unwrap(), 7);
        assert_eq!(Slice::step(6, -8, -2).result_size(7).unwrap(), 4);
        assert_eq!(Slice::step(5, 1, -2).result_size(7).unwrap(), 2);
        assert_eq!(Slice::step(3, 3, -1).result_size(7).unwrap(), 0);
    }

    #[test]
    fn test_contiguity_and_stride_flags() {
        assert!(Slice::all().is_contiguous());
        assert!(Slice::range(1, 3).is_contiguous());
        assert!(!Slice::step(0, 6, 2).is_contiguous());
        assert!(Slice::step(0, 6, 2).has_non_trivial_stride());
        assert!(!Slice::step(0, 6, 1).has_non_trivial_stride());
    }

    #[test]
    fn test_is_empty_after_normalization() {
        assert!(Slice::range(2, 2).is_empty(7));
        assert!(Slice::step(4, 4, 2).is_empty(7));
        // -3 resolves to 2 on a dimension of 5, leaving a [2, 2) window
        assert!(Slice::range(-3, 2).is_empty(5));
        assert!(!Slice::all().is_empty(7));
        assert!(!Slice::at(0).is_empty(7));
        // Invalid is not empty
        assert!(!Slice::range(5, 1).is_empty(7));
    }
}
