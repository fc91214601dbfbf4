//! Storage: shared element buffer with Arc-based reference counting

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Storage for tensor data
///
/// Storage wraps a flat element buffer with reference counting, enabling
/// zero-copy views (slice, broadcast, transpose-style strides) that share the
/// underlying buffer. A view's `Storage` clone is a shared back-reference:
/// the buffer stays alive while any handle exists, and no handle ever holds a
/// raw aliasing pointer.
///
/// Interior mutability goes through an `RwLock`; the execution model is
/// single-threaded (callers serialize), the lock only makes the sharing safe.
pub struct Storage<T> {
    inner: Arc<RwLock<Vec<T>>>,
}

impl<T> Storage<T> {
    /// Create storage from an existing buffer
    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(data)),
        }
    }

    /// Number of elements in the backing buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the backing buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Read access to the backing buffer
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.inner.read()
    }

    /// Write access to the backing buffer
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.inner.write()
    }

    /// Number of live handles to this buffer
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether two handles alias the same backing buffer
    #[inline]
    pub fn same_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for Storage<T> {
    /// Clone increments the reference count (zero-copy)
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Storage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("len", &self.len())
            .field("refs", &self.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_buffer() {
        let a = Storage::from_vec(vec![1.0f32, 2.0, 3.0]);
        let b = a.clone();
        assert!(a.same_buffer(&b));
        assert_eq!(a.ref_count(), 2);

        b.write()[1] = 9.0;
        assert_eq!(a.read()[1], 9.0);
    }

    #[test]
    fn test_refcount_drops() {
        let a = Storage::from_vec(vec![0u8; 4]);
        {
            let _b = a.clone();
            assert_eq!(a.ref_count(), 2);
        }
        assert_eq!(a.ref_count(), 1);
    }
}
