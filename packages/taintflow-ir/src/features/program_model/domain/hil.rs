//! High-level instructions.
//!
//! The lowered instruction stream the transfer function consumes:
//! assignments between access expressions and calls with resolved
//! dispatch candidates. Conditionals and metadata survive lowering but
//! carry no dataflow.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::procname::ProcName;
use crate::shared::models::{AccessPath, Base, Loc, Typ};

/// Literal constants appearing in expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

/// A lowered expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HilExpr {
    /// Read of a symbolic location
    Access(AccessPath),

    Constant(Literal),

    Cast(Typ, Box<HilExpr>),

    /// Exception value; frontends for void procedures encode `throw e`
    /// as an assignment of this to the return slot
    Exception(Box<HilExpr>),

    BinaryOp(Box<HilExpr>, Box<HilExpr>),

    Closure(ProcName),
}

impl HilExpr {
    /// The access path an expression reads, looking through casts.
    pub fn access_path(&self) -> Option<&AccessPath> {
        match self {
            HilExpr::Access(ap) => Some(ap),
            HilExpr::Cast(_, inner) => inner.access_path(),
            _ => None,
        }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self, HilExpr::Constant(Literal::Null))
    }

    pub fn contains_exception(&self) -> bool {
        match self {
            HilExpr::Exception(_) => true,
            HilExpr::Cast(_, inner) => inner.contains_exception(),
            HilExpr::BinaryOp(lhs, rhs) => lhs.contains_exception() || rhs.contains_exception(),
            _ => false,
        }
    }
}

impl fmt::Display for HilExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HilExpr::Access(ap) => write!(f, "{}", ap),
            HilExpr::Constant(Literal::Null) => write!(f, "null"),
            HilExpr::Constant(Literal::Bool(b)) => write!(f, "{}", b),
            HilExpr::Constant(Literal::Int(i)) => write!(f, "{}", i),
            HilExpr::Constant(Literal::Str(s)) => write!(f, "{:?}", s),
            HilExpr::Cast(typ, inner) => write!(f, "({}){}", typ, inner),
            HilExpr::Exception(inner) => write!(f, "exception({})", inner),
            HilExpr::BinaryOp(lhs, rhs) => write!(f, "{} op {}", lhs, rhs),
            HilExpr::Closure(pname) => write!(f, "closure({})", pname),
        }
    }
}

/// A lowered instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HilInstruction {
    /// `lhs := rhs`
    Assign {
        lhs: AccessPath,
        rhs: HilExpr,
        loc: Loc,
    },

    /// Call with statically resolved callee and the dynamic dispatch
    /// candidates the resolution pre-analysis found
    Call {
        /// Return slot bound at the call site, when the result is used
        ret: Option<Base>,
        callee: ProcName,
        dispatch_targets: Vec<ProcName>,
        actuals: Vec<HilExpr>,
        loc: Loc,
    },

    /// Branch condition; no dataflow effect
    Assume { cond: HilExpr, loc: Loc },

    /// Frontend bookkeeping; no dataflow effect
    Metadata { loc: Loc },
}

impl HilInstruction {
    pub fn loc(&self) -> Loc {
        match self {
            HilInstruction::Assign { loc, .. }
            | HilInstruction::Call { loc, .. }
            | HilInstruction::Assume { loc, .. }
            | HilInstruction::Metadata { loc } => *loc,
        }
    }
}

impl fmt::Display for HilInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HilInstruction::Assign { lhs, rhs, .. } => write!(f, "{} := {}", lhs, rhs),
            HilInstruction::Call {
                ret,
                callee,
                actuals,
                ..
            } => {
                if let Some(base) = ret {
                    write!(f, "{} := ", base)?;
                }
                write!(f, "{}(", callee)?;
                for (i, actual) in actuals.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", actual)?;
                }
                write!(f, ")")
            }
            HilInstruction::Assume { cond, .. } => write!(f, "assume {}", cond),
            HilInstruction::Metadata { .. } => write!(f, "metadata"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::Var;

    #[test]
    fn test_access_path_through_cast() {
        let ap = AccessPath::of_var(Var::named("x"), Typ::Int);
        let cast = HilExpr::Cast(Typ::Int, Box::new(HilExpr::Access(ap.clone())));
        assert_eq!(cast.access_path(), Some(&ap));
        assert_eq!(HilExpr::Constant(Literal::Int(1)).access_path(), None);
    }

    #[test]
    fn test_exception_detection() {
        let exn = HilExpr::Exception(Box::new(HilExpr::Constant(Literal::Null)));
        assert!(exn.contains_exception());
        assert!(HilExpr::Cast(Typ::Unknown, Box::new(exn)).contains_exception());
        assert!(!HilExpr::Constant(Literal::Null).contains_exception());
    }

    #[test]
    fn test_null_literal() {
        assert!(HilExpr::Constant(Literal::Null).is_null_literal());
        assert!(!HilExpr::Constant(Literal::Int(0)).is_null_literal());
    }
}
