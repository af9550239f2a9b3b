//! Program model: names, procedures, instructions, control flow.

pub mod cfg;
pub mod hil;
pub mod procedure;
pub mod procname;

pub use cfg::{CfgBuilder, CfgNode, NodeId, ProcCfg};
pub use hil::{HilExpr, HilInstruction, Literal};
pub use procedure::Procedure;
pub use procname::{Language, ProcName};
