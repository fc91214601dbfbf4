//! Data type system for tensr tensors
//!
//! This module provides the `DType` enum representing all supported element
//! types, the `Element` trait tying Rust types to dtypes, and the
//! `PromotionRules` interface consumed when composing mixed-precision
//! operands. The promotion rule tables themselves live outside the core; the
//! core only asks an injected [`PromotionRules`] instance for a decision.

mod element;
mod promotion;

pub use element::Element;
pub use promotion::{PromotionRules, StrictPromotion};

use std::fmt;

/// Data types supported by tensr tensors
///
/// This enum represents the element type of a tensor at runtime.
/// Using an enum (rather than generics alone) allows graph metadata and
/// promotion decisions to be expressed without monomorphizing the graph layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    /// 64-bit floating point
    F64,
    /// 32-bit floating point
    F32,
    /// 64-bit signed integer
    I64,
    /// 32-bit signed integer
    I32,
    /// Boolean (stored as one byte)
    Bool,
}

impl DType {
    /// Size of one element in bytes
    pub const fn size_in_bytes(self) -> usize {
        match self {
            DType::F64 | DType::I64 => 8,
            DType::F32 | DType::I32 => 4,
            DType::Bool => 1,
        }
    }

    /// Whether this is a floating-point type
    pub const fn is_float(self) -> bool {
        matches!(self, DType::F64 | DType::F32)
    }

    /// Whether this is an integer type
    pub const fn is_int(self) -> bool {
        matches!(self, DType::I64 | DType::I32)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::F64 => "f64",
            DType::F32 => "f32",
            DType::I64 => "i64",
            DType::I32 => "i32",
            DType::Bool => "bool",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_in_bytes() {
        assert_eq!(DType::F64.size_in_bytes(), 8);
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::Bool.size_in_bytes(), 1);
    }

    #[test]
    fn test_classification() {
        assert!(DType::F32.is_float());
        assert!(!DType::F32.is_int());
        assert!(DType::I64.is_int());
        assert!(!DType::Bool.is_float());
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::F32.to_string(), "f32");
        assert_eq!(DType::I64.to_string(), "i64");
    }
}
