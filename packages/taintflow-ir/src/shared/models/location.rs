//! Source locations and call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::features::program_model::domain::ProcName;

/// Position of an instruction in the analyzed source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Loc {
    /// Line number (1-indexed)
    pub line: u32,

    /// Column number (1-indexed, 0 when unknown)
    pub col: u32,
}

impl Loc {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Line-only location, column unknown.
    pub fn line(line: u32) -> Self {
        Self { line, col: 0 }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col == 0 {
            write!(f, "line {}", self.line)
        } else {
            write!(f, "line {}:{}", self.line, self.col)
        }
    }
}

/// A call instruction identified by callee and location.
///
/// Sources, sinks and passthroughs all anchor to the call site that
/// introduced them; reports are keyed to the site being interpreted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallSite {
    /// Called procedure
    pub pname: ProcName,

    /// Location of the call instruction
    pub loc: Loc,
}

impl CallSite {
    pub fn new(pname: ProcName, loc: Loc) -> Self {
        Self { pname, loc }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.pname, self.loc)
    }
}
