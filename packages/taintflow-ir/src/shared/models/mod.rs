//! Shared value models: locations, variables, types.

pub mod access_path;
pub mod location;
pub mod types;
pub mod var;

pub use access_path::{AbsAccessPath, AccessPath, PathStep};
pub use location::{CallSite, Loc};
pub use types::Typ;
pub use var::{Base, LogicalVar, ProgramVar, Var};
