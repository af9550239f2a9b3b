//! Variable bases for access paths.
//!
//! Two flavors: named program variables (with global/return/frontend-temp
//! classification) and numbered logical temporaries. Footprint logical
//! variables stand for the unknown input value of a formal; their stamp
//! is the 0-based index of that formal.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::Typ;

/// A named variable from the analyzed program.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProgramVar {
    pub name: String,

    /// Global (file- or class-level) storage
    pub is_global: bool,

    /// The synthetic return slot of the enclosing procedure
    pub is_return: bool,

    /// Temporary introduced by the frontend, not present in source.
    /// Non-managed frontends use a trailing frontend temp to pass
    /// by-reference returns.
    pub is_frontend_tmp: bool,
}

impl ProgramVar {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_global: false,
            is_return: false,
            is_frontend_tmp: false,
        }
    }

    pub fn global(name: impl Into<String>) -> Self {
        Self {
            is_global: true,
            ..Self::named(name)
        }
    }

    /// The return slot of the current procedure.
    pub fn ret() -> Self {
        Self {
            is_return: true,
            ..Self::named("return")
        }
    }

    pub fn frontend_tmp(name: impl Into<String>) -> Self {
        Self {
            is_frontend_tmp: true,
            ..Self::named(name)
        }
    }
}

/// A numbered temporary introduced during lowering or by the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogicalVar {
    /// Stamp. For footprint variables this is the formal index.
    pub id: usize,

    /// Stands for the unknown input value of a formal
    pub is_footprint: bool,
}

impl LogicalVar {
    pub fn fresh(id: usize) -> Self {
        Self {
            id,
            is_footprint: false,
        }
    }

    /// Footprint variable for the formal at `formal_index`.
    pub fn footprint(formal_index: usize) -> Self {
        Self {
            id: formal_index,
            is_footprint: true,
        }
    }
}

/// Root of an access path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Var {
    Program(ProgramVar),
    Logical(LogicalVar),
}

impl Var {
    pub fn named(name: impl Into<String>) -> Self {
        Var::Program(ProgramVar::named(name))
    }

    pub fn global(name: impl Into<String>) -> Self {
        Var::Program(ProgramVar::global(name))
    }

    pub fn ret() -> Self {
        Var::Program(ProgramVar::ret())
    }

    pub fn footprint(formal_index: usize) -> Self {
        Var::Logical(LogicalVar::footprint(formal_index))
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Var::Program(pvar) if pvar.is_global)
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Var::Program(pvar) if pvar.is_return)
    }

    pub fn is_frontend_tmp(&self) -> bool {
        matches!(self, Var::Program(pvar) if pvar.is_frontend_tmp)
    }

    /// Formal index for a footprint variable, `None` otherwise.
    pub fn footprint_index(&self) -> Option<usize> {
        match self {
            Var::Logical(lvar) if lvar.is_footprint => Some(lvar.id),
            _ => None,
        }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Var::Program(pvar) => write!(f, "{}", pvar.name),
            Var::Logical(lvar) if lvar.is_footprint => write!(f, "footprint({})", lvar.id),
            Var::Logical(lvar) => write!(f, "${}", lvar.id),
        }
    }
}

/// A variable together with its type; the key of access tree roots.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Base {
    pub var: Var,
    pub typ: Typ,
}

impl Base {
    pub fn new(var: Var, typ: Typ) -> Self {
        Self { var, typ }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_flags() {
        assert!(Var::global("g").is_global());
        assert!(!Var::global("g").is_return());
        assert!(Var::ret().is_return());
        assert!(Var::Program(ProgramVar::frontend_tmp("__tmp0")).is_frontend_tmp());
        assert!(!Var::named("x").is_global());
    }

    #[test]
    fn test_footprint_stamp_is_formal_index() {
        let var = Var::footprint(2);
        assert_eq!(var.footprint_index(), Some(2));
        assert_eq!(Var::Logical(LogicalVar::fresh(2)).footprint_index(), None);
        assert_eq!(Var::named("x").footprint_index(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Var::named("user").to_string(), "user");
        assert_eq!(Var::footprint(0).to_string(), "footprint(0)");
        assert_eq!(Var::Logical(LogicalVar::fresh(3)).to_string(), "$3");
    }
}
