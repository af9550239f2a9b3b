//! Taint analysis infrastructure: the access tree state, the transfer
//! function over it, summary instantiation and construction, and the
//! per-procedure driver.

pub mod access_tree;
pub mod checker;
pub mod footprint;
pub mod formal_map;
pub mod reporting;
pub mod summary_apply;
pub mod summary_builder;
pub mod summary_store;
pub mod transfer;

pub use access_tree::{Subtree, TaintTree, TreeNode};
pub use checker::{CheckerOutcome, TaintChecker};
pub use footprint::{lookup_with_footprint, trace_with_footprint};
pub use formal_map::FormalMap;
pub use reporting::{Issue, Reporter};
pub use summary_apply::{apply_summary, ApplyCtx};
pub use summary_builder::make_summary;
pub use summary_store::InMemorySummaryStore;
pub use transfer::TaintTransfer;
