//! Per-procedure driver.
//!
//! Seeds the initial access tree from the taint spec's tainted formals, runs
//! the worklist to fixpoint, and compresses the post-state into a
//! summary. Dispatch targets arrive pre-resolved inside call
//! instructions, so no separate pre-analysis pass runs here.

use super::access_tree::TaintTree;
use super::formal_map::FormalMap;
use super::reporting::{Issue, Reporter};
use super::summary_builder::make_summary;
use super::transfer::TaintTransfer;
use crate::config::{EndpointRegistry, TaintAnalysisConfig};
use crate::errors::{Result, TaintflowError};
use crate::features::dataflow::infrastructure::WorklistSolver;
use crate::features::program_model::domain::Procedure;
use crate::features::program_model::ports::LoweringQuirks;
use crate::features::taint_analysis::domain::summary::ProcSummary;
use crate::features::taint_analysis::domain::trace::TraceDomain;
use crate::features::taint_analysis::ports::{SummaryAccess, TaintSpec};
use crate::shared::models::AbsAccessPath;

/// Result of analyzing one procedure.
#[derive(Debug)]
pub struct CheckerOutcome<T> {
    /// `None` for bodyless procedures
    pub summary: Option<ProcSummary<T>>,

    pub issues: Vec<Issue>,
}

/// The analysis entry point for one procedure.
pub struct TaintChecker<'a, S: TaintSpec> {
    spec: &'a S,
    store: &'a dyn SummaryAccess<S::Trace>,
    quirks: &'a dyn LoweringQuirks,
    config: &'a TaintAnalysisConfig,
}

impl<'a, S: TaintSpec> TaintChecker<'a, S> {
    pub fn new(
        spec: &'a S,
        store: &'a dyn SummaryAccess<S::Trace>,
        quirks: &'a dyn LoweringQuirks,
        config: &'a TaintAnalysisConfig,
    ) -> Self {
        Self {
            spec,
            store,
            quirks,
            config,
        }
    }

    pub fn check(&self, proc: &Procedure) -> Result<CheckerOutcome<S::Trace>> {
        // A broken endpoints file must abort the analysis, not degrade
        // into reports without endpoint notes.
        EndpointRegistry::ensure_loaded(self.config)?;

        let formals = FormalMap::of_procedure(proc);
        let initial = self.initial_state(proc);
        let reporter = Reporter::new(&proc.pname, self.store);

        let post = {
            let transfer = TaintTransfer {
                spec: self.spec,
                proc,
                formals: &formals,
                quirks: self.quirks,
                store: self.store,
                reporter: &reporter,
                config: self.config,
            };
            WorklistSolver::new(self.config.max_iterations).compute_post(
                &proc.cfg,
                &transfer,
                initial,
                &proc.pname.to_string(),
            )?
        };

        match post {
            Some(tree) => {
                let summary = make_summary(self.spec, proc, &formals, tree);
                Ok(CheckerOutcome {
                    summary: Some(summary),
                    issues: reporter.into_issues(),
                })
            }
            None if proc.cfg.entry_has_successors() => Err(TaintflowError::MissingPost {
                proc: proc.pname.to_string(),
            }),
            None => Ok(CheckerOutcome {
                summary: None,
                issues: reporter.into_issues(),
            }),
        }
    }

    fn initial_state(&self, proc: &Procedure) -> TaintTree<S::Trace> {
        let mut initial = TaintTree::new();
        for (index, source) in self.spec.tainted_formals(proc) {
            if let Some(path) = proc.formal_path(index) {
                initial.add_trace(
                    &AbsAccessPath::Exact(path),
                    S::Trace::of_source(source),
                );
            }
        }
        initial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::program_model::domain::{
        CfgBuilder, HilExpr, HilInstruction, Language, ProcName,
    };
    use crate::features::program_model::ports::DefaultLoweringQuirks;
    use crate::features::taint_analysis::domain::flow_trace::{FlowSink, FlowSource, FlowTrace};
    use crate::features::taint_analysis::infrastructure::summary_store::InMemorySummaryStore;
    use crate::features::taint_analysis::ports::{
        PropagationRule, SinkDecl, SourceDecl,
    };
    use crate::shared::models::{AccessPath, CallSite, Loc, Typ, Var};

    /// Formal 0 of every procedure named "handler" is tainted; "sink"
    /// consumes actual 0.
    struct HandlerSpec;

    impl TaintSpec for HandlerSpec {
        type Trace = FlowTrace;
        type Source = FlowSource;
        type Sink = FlowSink;

        fn source_of_call(
            &self,
            _callee: &ProcName,
            _actuals: &[HilExpr],
            _site: &CallSite,
        ) -> Option<SourceDecl<FlowSource>> {
            None
        }

        fn tainted_formals(&self, proc: &Procedure) -> Vec<(usize, FlowSource)> {
            if proc.pname.base_name() == "handler" {
                let site = CallSite::new(proc.pname.clone(), Loc::line(0));
                vec![(0, FlowSource::call("TaintedFormal", site))]
            } else {
                Vec::new()
            }
        }

        fn sinks_of_call(
            &self,
            callee: &ProcName,
            _actuals: &[HilExpr],
            site: &CallSite,
        ) -> Vec<SinkDecl<FlowSink>> {
            if callee.base_name() == "sink" {
                vec![SinkDecl {
                    sink: FlowSink::new("Exec", site.clone()),
                    index: 0,
                    report_reachable: false,
                }]
            } else {
                Vec::new()
            }
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
    fn test_tainted_formal_flows_to_sink() {
        let pname = ProcName::plain("handler", Language::Java);
        let call = HilInstruction::Call {
            ret: None,
            callee: ProcName::plain("sink", Language::Java),
            dispatch_targets: vec![],
            actuals: vec![HilExpr::Access(AccessPath::of_var(
                Var::named("req"),
                Typ::Str,
            ))],
            loc: Loc::line(3),
        };
        let proc = Procedure::new(
            pname,
            vec![("req".to_string(), Typ::Str)],
            Typ::Void,
            CfgBuilder::linear(vec![vec![call]]),
        );

        let store: InMemorySummaryStore<FlowTrace> = InMemorySummaryStore::new();
        let config = TaintAnalysisConfig::default();
        let checker = TaintChecker::new(&HandlerSpec, &store, &DefaultLoweringQuirks, &config);
        let outcome = checker.check(&proc).unwrap();

        assert_eq!(outcome.issues.len(), 1);
        assert!(outcome.issues[0].description.contains("TaintedFormal"));
        assert!(outcome.summary.is_some());
    }

    #[test]
    fn test_bodyless_procedure_yields_no_summary() {
        let mut builder = CfgBuilder::new();
        let entry = builder.add_node(Vec::new());
        let cfg = builder.build(entry, entry);
        let proc = Procedure::new(
            ProcName::plain("extern_decl", Language::Java),
            vec![],
            Typ::Void,
            cfg,
        );

        let store: InMemorySummaryStore<FlowTrace> = InMemorySummaryStore::new();
        let config = TaintAnalysisConfig::default();
        let checker = TaintChecker::new(&HandlerSpec, &store, &DefaultLoweringQuirks, &config);
        let outcome = checker.check(&proc).unwrap();

        assert!(outcome.summary.is_none());
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_sink_through_formal_recorded_in_summary() {
        // f(a) { sink(a); } with no tainted formals: no report, but the
        // summary records the sink at footprint(0).
        let call = HilInstruction::Call {
            ret: None,
            callee: ProcName::plain("sink", Language::Java),
            dispatch_targets: vec![],
            actuals: vec![HilExpr::Access(AccessPath::of_var(
                Var::named("a"),
                Typ::Str,
            ))],
            loc: Loc::line(2),
        };
        let proc = Procedure::new(
            ProcName::plain("f", Language::Java),
            vec![("a".to_string(), Typ::Str)],
            Typ::Void,
            CfgBuilder::linear(vec![vec![call]]),
        );

        let store: InMemorySummaryStore<FlowTrace> = InMemorySummaryStore::new();
        let config = TaintAnalysisConfig::default();
        let checker = TaintChecker::new(&HandlerSpec, &store, &DefaultLoweringQuirks, &config);
        let outcome = checker.check(&proc).unwrap();

        // Footprint-only flow: nothing reportable yet.
        assert!(outcome.issues.is_empty());

        let summary = outcome.summary.unwrap();
        let bases = summary.tree().bases();
        assert_eq!(bases.len(), 1);
        assert_eq!(bases[0].var.footprint_index(), Some(0));
    }
}
