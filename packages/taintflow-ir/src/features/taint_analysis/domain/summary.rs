//! Procedure summaries.

use serde::{Deserialize, Serialize};

use super::trace::TraceDomain;
use crate::features::taint_analysis::infrastructure::access_tree::TaintTree;

/// The distilled taint behavior of one procedure.
///
/// The tree is expressed only over globals, the return slot, and
/// footprint variables indexed by formal position; caller-local names
/// never appear. Summaries are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcSummary<T> {
    tree: TaintTree<T>,
}

impl<T: TraceDomain> ProcSummary<T> {
    pub fn new(tree: TaintTree<T>) -> Self {
        Self { tree }
    }

    pub fn empty() -> Self {
        Self {
            tree: TaintTree::new(),
        }
    }

    pub fn tree(&self) -> &TaintTree<T> {
        &self.tree
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
