//! Evaluation trait.

use crate::models::{Evaluation, Operation, ResourceDescriptor, Subject};

/// Predicts whether `subject` may perform `operation` on `target`.
///
/// Implementations are pure and total: the same inputs always produce the
/// same [`Evaluation`], and every input produces one.
pub trait PolicyEvaluator: Send + Sync {
    fn expected(
        &self,
        subject: &Subject,
        target: &ResourceDescriptor,
        operation: Operation,
    ) -> Evaluation;
}
