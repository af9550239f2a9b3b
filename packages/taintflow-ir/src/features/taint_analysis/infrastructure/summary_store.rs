//! Shared summary store.
//!
//! Concurrent map from procedure name to finished summary. Procedures
//! analyzed in parallel read each other's completed summaries; a
//! procedure never reads its own slot while it is being computed, which
//! keeps on-demand reads reentrant without being recursive.

use dashmap::DashMap;

use crate::features::program_model::domain::ProcName;
use crate::features::taint_analysis::domain::summary::ProcSummary;
use crate::features::taint_analysis::domain::trace::TraceDomain;
use crate::features::taint_analysis::ports::SummaryAccess;

/// In-memory summary store backed by a concurrent map.
#[derive(Debug)]
pub struct InMemorySummaryStore<T> {
    summaries: DashMap<ProcName, ProcSummary<T>>,
}

impl<T: TraceDomain> Default for InMemorySummaryStore<T> {
    fn default() -> Self {
        Self {
            summaries: DashMap::new(),
        }
    }
}

impl<T: TraceDomain> InMemorySummaryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished summary. Later reads observe it.
    pub fn write(&self, proc: ProcName, summary: ProcSummary<T>) {
        self.summaries.insert(proc, summary);
    }

    pub fn get(&self, proc: &ProcName) -> Option<ProcSummary<T>> {
        self.summaries.get(proc).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

impl<T: TraceDomain + Send + Sync> SummaryAccess<T> for InMemorySummaryStore<T> {
    fn read_summary(&self, current: &ProcName, callee: &ProcName) -> Option<ProcSummary<T>> {
        if current == callee {
            // Recursion guard: the slot for the procedure being
            // analyzed is not observable from inside it.
            return None;
        }
        self.get(callee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::program_model::domain::Language;
    use crate::features::taint_analysis::domain::flow_trace::FlowTrace;

    #[test]
    fn test_read_your_writes() {
        let store: InMemorySummaryStore<FlowTrace> = InMemorySummaryStore::new();
        let callee = ProcName::plain("callee", Language::Java);
        let caller = ProcName::plain("caller", Language::Java);

        assert!(store.read_summary(&caller, &callee).is_none());
        store.write(callee.clone(), ProcSummary::empty());
        assert!(store.read_summary(&caller, &callee).is_some());
    }

    #[test]
    fn test_self_read_is_refused() {
        let store: InMemorySummaryStore<FlowTrace> = InMemorySummaryStore::new();
        let proc = ProcName::plain("rec", Language::Java);
        store.write(proc.clone(), ProcSummary::empty());

        assert!(store.read_summary(&proc, &proc).is_none());
        // The slot itself is populated; only the self-read is blocked.
        assert!(store.get(&proc).is_some());
    }
}
