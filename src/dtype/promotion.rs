//! Type promotion interface for binary operations
//!
//! The core never defines promotion rule tables; it only consumes a decision
//! from an injected [`PromotionRules`] instance (carried by
//! `ExecutionContext`, never a process-wide singleton).

use super::DType;
use crate::error::{Error, Result};

/// Decides the result dtype when two operands of different dtypes meet
///
/// Implementations live outside the core. The recording layer calls
/// `promote` when building the output spec of a binary operation.
pub trait PromotionRules: Send + Sync {
    /// Return the promoted dtype for a binary operation over `lhs` and `rhs`,
    /// or an error if the combination is not representable.
    fn promote(&self, lhs: DType, rhs: DType) -> Result<DType>;
}

/// Default rules: operands must already share a dtype
///
/// The minimal decision procedure a context can carry without importing any
/// external rule table. Mixed operands are rejected rather than silently
/// widened.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictPromotion;

impl PromotionRules for StrictPromotion {
    fn promote(&self, lhs: DType, rhs: DType) -> Result<DType> {
        if lhs == rhs {
            Ok(lhs)
        } else {
            Err(Error::DTypeMismatch { lhs, rhs })
        }
    }
}
