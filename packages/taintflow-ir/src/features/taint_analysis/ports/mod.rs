/*
 * Taint Analysis Ports
 *
 * The taint specification is a capability bundle: which calls produce
 * tainted values, which consume them, how calls without summaries
 * propagate, and which types are worth tracking. Applications implement
 * TaintSpec once per rule set; the analyzer core is generic over it.
 *
 * The summary store is the only external state the core touches. Reads
 * may trigger on-demand analysis of the callee on the store side; the
 * core only requires that a procedure never observes its own summary
 * while it is still being computed.
 */

use serde::{Deserialize, Serialize};

use crate::features::program_model::domain::{HilExpr, ProcName, Procedure};
use crate::features::taint_analysis::domain::summary::ProcSummary;
use crate::features::taint_analysis::domain::trace::{SinkKind, SourceKind, TraceDomain};
use crate::features::taint_analysis::infrastructure::access_tree::TaintTree;
use crate::shared::models::{CallSite, Typ};

/// A source declaration at a call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDecl<S> {
    pub source: S,

    /// `None`: the return value is the source. `Some(i)`: the i-th
    /// actual becomes tainted.
    pub index: Option<usize>,
}

/// A sink declaration at a call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkDecl<K> {
    pub sink: K,

    /// Actual whose value reaches the sink
    pub index: usize,

    /// Report anything reachable from the actual, not just the actual
    /// itself
    pub report_reachable: bool,
}

/// How an unknown call moves taint between its actuals and result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropagationRule {
    /// Join the traces of all actuals into the return value
    PropagateToReturn,

    /// Join the traces of the non-receiver actuals into the receiver
    PropagateToReceiver,

    /// Join the traces of all actuals into the i-th actual
    PropagateToActual(usize),
}

/// The taint specification: sources, sinks, unknown-call behavior and
/// type policy for one application domain.
pub trait TaintSpec: Send + Sync {
    type Trace: TraceDomain<Source = Self::Source, Sink = Self::Sink>;
    type Source: SourceKind;
    type Sink: SinkKind;

    /// Source introduced by a call, if the taint spec labels one.
    fn source_of_call(
        &self,
        callee: &ProcName,
        actuals: &[HilExpr],
        site: &CallSite,
    ) -> Option<SourceDecl<Self::Source>>;

    /// Sources seeded on the formals of a procedure before analysis
    /// starts (entry points receiving attacker-controlled arguments).
    fn tainted_formals(&self, proc: &Procedure) -> Vec<(usize, Self::Source)>;

    /// Sinks triggered by a call.
    fn sinks_of_call(
        &self,
        callee: &ProcName,
        actuals: &[HilExpr],
        site: &CallSite,
    ) -> Vec<SinkDecl<Self::Sink>>;

    /// Propagation rules for a callee with no summary.
    fn unknown_call_rules(
        &self,
        callee: &ProcName,
        ret_typ: Option<&Typ>,
        actuals: &[HilExpr],
    ) -> Vec<PropagationRule>;

    /// Types whose values are worth tracking through unknown calls.
    fn is_taintable_type(&self, typ: &Typ) -> bool;

    /// Unknown call that is really an assignment. The historical case
    /// is C++ `operator=`.
    fn call_behaves_as_assignment(&self, callee: &ProcName) -> bool {
        callee.base_name() == "operator=" && !callee.language.is_managed()
    }

    /// Wrap a finished, re-keyed tree for storage.
    fn to_summary_tree(&self, tree: TaintTree<Self::Trace>) -> ProcSummary<Self::Trace> {
        ProcSummary::new(tree)
    }

    /// Unwrap a stored summary for instantiation.
    fn of_summary_tree<'a>(
        &self,
        summary: &'a ProcSummary<Self::Trace>,
    ) -> &'a TaintTree<Self::Trace> {
        summary.tree()
    }
}

/// Read access to the shared summary store.
pub trait SummaryAccess<T: TraceDomain>: Send + Sync {
    /// Summary of `callee`, read from within the analysis of `current`.
    /// Must answer `None` when `callee` is `current`; a procedure never
    /// observes its own in-progress summary.
    fn read_summary(&self, current: &ProcName, callee: &ProcName) -> Option<ProcSummary<T>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::program_model::domain::Language;

    struct NameOnlySpec;

    impl TaintSpec for NameOnlySpec {
        type Trace = crate::features::taint_analysis::domain::flow_trace::FlowTrace;
        type Source = crate::features::taint_analysis::domain::flow_trace::FlowSource;
        type Sink = crate::features::taint_analysis::domain::flow_trace::FlowSink;

        fn source_of_call(
            &self,
            _callee: &ProcName,
            _actuals: &[HilExpr],
            _site: &CallSite,
        ) -> Option<SourceDecl<Self::Source>> {
            None
        }

        fn tainted_formals(&self, _proc: &Procedure) -> Vec<(usize, Self::Source)> {
            Vec::new()
        }

        fn sinks_of_call(
            &self,
            _callee: &ProcName,
            _actuals: &[HilExpr],
            _site: &CallSite,
        ) -> Vec<SinkDecl<Self::Sink>> {
            Vec::new()
        }

        fn unknown_call_rules(
            &self,
            _callee: &ProcName,
            _ret_typ: Option<&Typ>,
            _actuals: &[HilExpr],
        ) -> Vec<PropagationRule> {
            Vec::new()
        }

        fn is_taintable_type(&self, _typ: &Typ) -> bool {
            true
        }
    }

    #[test]
    fn test_assignment_hook_default() {
        let spec = NameOnlySpec;
        assert!(spec.call_behaves_as_assignment(&ProcName::plain("operator=", Language::Cpp)));
        assert!(!spec.call_behaves_as_assignment(&ProcName::plain("operator=", Language::Java)));
        assert!(!spec.call_behaves_as_assignment(&ProcName::plain("assign", Language::Cpp)));
    }
}
