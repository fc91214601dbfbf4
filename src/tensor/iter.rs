//! Row-major iterator over a shape's logical index space

use super::shape::{Shape, STACK_DIMS};
use smallvec::SmallVec;

/// Iterates every index tuple of a shape in row-major order
///
/// Backs `copy_to` and materialization: walking the logical index space in
/// this order produces the contiguous element order of a Dense result.
pub struct IndexIter {
    shape: Shape,
    current: SmallVec<[usize; STACK_DIMS]>,
    remaining: usize,
}

impl IndexIter {
    /// Create an iterator over all indices of `shape`
    pub fn new(shape: &Shape) -> Self {
        Self {
            shape: shape.clone(),
            current: shape.iter().map(|_| 0).collect(),
            remaining: shape.volume(),
        }
    }
}

impl Iterator for IndexIter {
    type Item = SmallVec<[usize; STACK_DIMS]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.current.clone();
        self.remaining -= 1;

        // Advance like an odometer, rightmost dimension fastest
        for dim in (0..self.current.len()).rev() {
            self.current[dim] += 1;
            if self.current[dim] < self.shape[dim] {
                break;
            }
            self.current[dim] = 0;
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for IndexIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_order() {
        let indices: Vec<Vec<usize>> = IndexIter::new(&Shape::from([2, 3]))
            .map(|i| i.to_vec())
            .collect();
        assert_eq!(
            indices,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2]
            ]
        );
    }

    #[test]
    fn test_scalar_yields_one_empty_tuple() {
        let indices: Vec<_> = IndexIter::new(&Shape::scalar()).collect();
        assert_eq!(indices.len(), 1);
        assert!(indices[0].is_empty());
    }

    #[test]
    fn test_zero_volume() {
        assert_eq!(IndexIter::new(&Shape::from([2, 0])).count(), 0);
    }
}
