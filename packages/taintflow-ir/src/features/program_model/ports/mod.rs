//! Lowering quirk predicates.
//!
//! Some frontends encode control effects as spurious assignments to the
//! return slot. Which assignments are spurious is the lowering's
//! knowledge, not the analysis's, so the transfer function consults this
//! port instead of hardcoding the patterns.

use super::domain::{HilExpr, Procedure};
use crate::shared::models::AccessPath;

/// Predicates identifying assignments that are lowering artifacts and
/// must be ignored by dataflow.
pub trait LoweringQuirks {
    /// `throw e` in a void procedure lowered as `return := exception(e)`.
    fn is_exception_return(&self, proc: &Procedure, lhs: &AccessPath, rhs: &HilExpr) -> bool {
        let _ = proc;
        lhs.base.var.is_return() && rhs.contains_exception()
    }

    /// `return null` materialized in a procedure whose return type is
    /// void.
    fn is_null_return_in_void(&self, proc: &Procedure, lhs: &AccessPath, rhs: &HilExpr) -> bool {
        lhs.base.var.is_return() && proc.ret_typ.is_void() && rhs.is_null_literal()
    }
}

/// The historical frontend behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLoweringQuirks;

impl LoweringQuirks for DefaultLoweringQuirks {}
