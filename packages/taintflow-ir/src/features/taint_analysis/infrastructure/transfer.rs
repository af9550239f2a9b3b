/*
 * Taint Transfer Function
 *
 * Interprets one high-level instruction against the access tree.
 *
 * Assignments copy the node of the right-hand side (with footprint
 * fallback for unseen formal/global reads) to the left-hand side.
 *
 * Calls run a pipeline per dispatch target, joined at the end:
 *   1. enumerate targets (bounded; above the bound only the static
 *      callee survives),
 *   2. inject sinks declared at this site and report completed flows,
 *   3. inject sources declared at this site,
 *   4. otherwise graft the callee summary, or fall back to the
 *      unknown-call propagation rules.
 *
 * A site that matched a sink or source never also applies the summary;
 * the taint spec's declaration replaces the callee's behavior there.
 */

use tracing::{debug, warn};

use super::access_tree::{TaintTree, TreeNode};
use super::footprint::{lookup_with_footprint, trace_with_footprint};
use super::formal_map::FormalMap;
use super::reporting::Reporter;
use super::summary_apply::{apply_summary, ApplyCtx};
use crate::config::TaintAnalysisConfig;
use crate::errors::{Result, TaintflowError};
use crate::features::dataflow::infrastructure::{AbstractDomain, TransferFunctions};
use crate::features::program_model::domain::{
    HilExpr, HilInstruction, NodeId, ProcName, Procedure,
};
use crate::features::program_model::ports::LoweringQuirks;
use crate::features::taint_analysis::domain::trace::{SourceKind, TraceDomain};
use crate::features::taint_analysis::ports::{
    PropagationRule, SinkDecl, SourceDecl, SummaryAccess, TaintSpec,
};
use crate::shared::models::{AbsAccessPath, AccessPath, Base, CallSite, Loc, Typ};

impl<T: TraceDomain> AbstractDomain for TaintTree<T> {
    fn join(&self, other: &Self) -> Self {
        TaintTree::join(self, other)
    }

    fn leq(&self, other: &Self) -> bool {
        TaintTree::leq(self, other)
    }
}

/// Transfer function for one procedure.
pub struct TaintTransfer<'a, S: TaintSpec> {
    pub spec: &'a S,
    pub proc: &'a Procedure,
    pub formals: &'a FormalMap,
    pub quirks: &'a dyn LoweringQuirks,
    pub store: &'a dyn SummaryAccess<S::Trace>,
    pub reporter: &'a Reporter<'a, S::Trace>,
    pub config: &'a TaintAnalysisConfig,
}

impl<'a, S: TaintSpec> TransferFunctions for TaintTransfer<'a, S> {
    type Domain = TaintTree<S::Trace>;

    fn exec_instr(
        &self,
        pre: Self::Domain,
        instr: &HilInstruction,
        _node: NodeId,
    ) -> Result<Self::Domain> {
        match instr {
            HilInstruction::Assign { lhs, rhs, .. } => Ok(self.exec_assign(pre, lhs, rhs)),
            HilInstruction::Call {
                ret,
                callee,
                dispatch_targets,
                actuals,
                loc,
            } => self.exec_call(pre, ret.as_ref(), callee, dispatch_targets, actuals, *loc),
            HilInstruction::Assume { .. } | HilInstruction::Metadata { .. } => Ok(pre),
        }
    }
}

impl<'a, S: TaintSpec> TaintTransfer<'a, S> {
    fn exec_assign(
        &self,
        mut state: TaintTree<S::Trace>,
        lhs: &AccessPath,
        rhs: &HilExpr,
    ) -> TaintTree<S::Trace> {
        if self.quirks.is_exception_return(self.proc, lhs, rhs)
            || self.quirks.is_null_return_in_void(self.proc, lhs, rhs)
        {
            return state;
        }
        let node = self
            .expr_node(rhs, &state)
            .unwrap_or_else(TreeNode::empty);
        state.add_node(&AbsAccessPath::Exact(lhs.clone()), node);
        state
    }

    fn expr_node(
        &self,
        expr: &HilExpr,
        state: &TaintTree<S::Trace>,
    ) -> Option<TreeNode<S::Trace>> {
        let raw = expr.access_path()?;
        lookup_with_footprint(&AbsAccessPath::Exact(raw.clone()), state, self.formals)
    }

    fn exec_call(
        &self,
        pre: TaintTree<S::Trace>,
        ret: Option<&Base>,
        callee: &ProcName,
        dispatch_targets: &[ProcName],
        actuals: &[HilExpr],
        loc: Loc,
    ) -> Result<TaintTree<S::Trace>> {
        let mut targets = vec![callee.clone()];
        if dispatch_targets.len() > self.config.max_dispatch_targets {
            debug!(
                "dropping {} dispatch targets of {}: above cap {}",
                dispatch_targets.len(),
                callee,
                self.config.max_dispatch_targets
            );
        } else {
            targets.extend(dispatch_targets.iter().cloned());
        }

        let mut post: Option<TaintTree<S::Trace>> = None;
        for target in &targets {
            let target_post = self.analyze_one_target(pre.clone(), ret, target, actuals, loc)?;
            post = Some(match post {
                Some(acc) => acc.join(&target_post),
                None => target_post,
            });
        }
        Ok(post.unwrap_or(pre))
    }

    fn analyze_one_target(
        &self,
        mut state: TaintTree<S::Trace>,
        ret: Option<&Base>,
        callee: &ProcName,
        actuals: &[HilExpr],
        loc: Loc,
    ) -> Result<TaintTree<S::Trace>> {
        let site = CallSite::new(callee.clone(), loc);

        let sinks = self.spec.sinks_of_call(callee, actuals, &site);
        for decl in &sinks {
            state = self.add_sink(state, decl, actuals, callee, &site)?;
        }

        let source = self.spec.source_of_call(callee, actuals, &site);
        if let Some(decl) = &source {
            state = self.add_source(state, decl, ret, actuals, callee, &site)?;
        }

        // A matched declaration replaces the callee's own behavior.
        if !sinks.is_empty() || source.is_some() {
            return Ok(state);
        }

        match self.store.read_summary(&self.proc.pname, callee) {
            Some(summary) if !(callee.is_constructor && summary.is_empty()) => {
                let ctx = ApplyCtx {
                    ret,
                    actuals,
                    caller_formals: self.formals,
                    reporter: self.reporter,
                    call_site: &site,
                };
                apply_summary(state, &summary, &ctx)
            }
            _ => self.handle_unknown_call(state, ret, callee, actuals, &site),
        }
    }

    fn add_sink(
        &self,
        mut state: TaintTree<S::Trace>,
        decl: &SinkDecl<S::Sink>,
        actuals: &[HilExpr],
        callee: &ProcName,
        site: &CallSite,
    ) -> Result<TaintTree<S::Trace>> {
        let actual = actuals
            .get(decl.index)
            .ok_or_else(|| TaintflowError::MalformedSpecIndex {
                callee: callee.to_string(),
                index: decl.index,
                actual_count: actuals.len(),
            })?;
        let raw = match actual.access_path() {
            Some(raw) => raw.clone(),
            None => return Ok(state),
        };
        let ap = if decl.report_reachable || raw.typ().is_array_like() {
            AbsAccessPath::Abstracted(raw)
        } else {
            AbsAccessPath::Exact(raw)
        };
        if let Some(node) = lookup_with_footprint(&ap, &state, self.formals) {
            let trace = node.trace.add_sink(decl.sink.clone());
            self.reporter.report_trace(&trace, site);
            state.add_trace(&ap, trace);
        }
        Ok(state)
    }

    fn add_source(
        &self,
        mut state: TaintTree<S::Trace>,
        decl: &SourceDecl<S::Source>,
        ret: Option<&Base>,
        actuals: &[HilExpr],
        callee: &ProcName,
        site: &CallSite,
    ) -> Result<TaintTree<S::Trace>> {
        match decl.index {
            None => match ret {
                Some(ret_base) => {
                    let ap = AbsAccessPath::Exact(AccessPath::of_base(ret_base.clone()));
                    state.add_trace(&ap, S::Trace::of_source(decl.source.clone()));
                }
                None => {
                    // Unmanaged frontends return non-pointers through a
                    // trailing by-reference temporary.
                    let tail_tmp = (!callee.language.is_managed())
                        .then(|| actuals.last())
                        .flatten()
                        .and_then(|expr| expr.access_path())
                        .filter(|raw| raw.base.var.is_frontend_tmp());
                    match tail_tmp {
                        Some(raw) => {
                            let ap = AbsAccessPath::Exact(raw.clone());
                            state.add_trace(&ap, S::Trace::of_source(decl.source.clone()));
                        }
                        None => {
                            warn!(
                                "source {} at {} declared with no index, but the call binds no return value; skipping",
                                callee, site.loc
                            );
                        }
                    }
                }
            },
            Some(index) => {
                let actual =
                    actuals
                        .get(index)
                        .ok_or_else(|| TaintflowError::MalformedSpecIndex {
                            callee: callee.to_string(),
                            index,
                            actual_count: actuals.len(),
                        })?;
                if let Some(raw) = actual.access_path() {
                    let ap = AbsAccessPath::Exact(raw.clone());
                    let trace = trace_with_footprint(&ap, &state, self.formals);
                    state.add_trace(&ap, trace.add_source(decl.source.clone()));
                }
            }
        }
        Ok(state)
    }

    fn handle_unknown_call(
        &self,
        state: TaintTree<S::Trace>,
        ret: Option<&Base>,
        callee: &ProcName,
        actuals: &[HilExpr],
        site: &CallSite,
    ) -> Result<TaintTree<S::Trace>> {
        if self.spec.call_behaves_as_assignment(callee) {
            return match actuals {
                [HilExpr::Access(lhs), rhs] => Ok(self.exec_assign(state, lhs, rhs)),
                _ => Err(TaintflowError::UnexpectedAssignmentOperator {
                    instr: format!("{}({} actuals) at {}", callee, actuals.len(), site.loc),
                }),
            };
        }

        let rules = self
            .spec
            .unknown_call_rules(callee, ret.map(|base| &base.typ), actuals);
        if rules.is_empty() || actuals.is_empty() {
            return Ok(state);
        }

        // With a variadic-looking tail, every type is taintable here.
        let taint_all_types = actuals
            .last()
            .and_then(|expr| expr.access_path())
            .map(|raw| raw.typ().is_variadic_array())
            .unwrap_or(false);

        let mut state = state;
        for rule in rules {
            state = match rule {
                PropagationRule::PropagateToReturn => match ret {
                    Some(ret_base) => {
                        let target = AbsAccessPath::Abstracted(AccessPath::of_base(
                            ret_base.clone(),
                        ));
                        self.propagate(state, &target, actuals, taint_all_types)
                    }
                    None => state,
                },
                PropagationRule::PropagateToReceiver => match actuals {
                    [receiver, rest @ ..] if !rest.is_empty() => {
                        match receiver.access_path() {
                            Some(raw) => {
                                let target = AbsAccessPath::Abstracted(raw.clone());
                                self.propagate(state, &target, rest, taint_all_types)
                            }
                            None => state,
                        }
                    }
                    _ => state,
                },
                PropagationRule::PropagateToActual(index) => {
                    match actuals.get(index).and_then(|expr| expr.access_path()) {
                        Some(raw) => {
                            let target = AbsAccessPath::Abstracted(raw.clone());
                            self.propagate(state, &target, actuals, taint_all_types)
                        }
                        None => state,
                    }
                }
            };
        }
        Ok(state)
    }

    /// Join the traces of `from_actuals` into `target`, keeping only
    /// sources whose values are worth tracking.
    fn propagate(
        &self,
        mut state: TaintTree<S::Trace>,
        target: &AbsAccessPath,
        from_actuals: &[HilExpr],
        taint_all_types: bool,
    ) -> TaintTree<S::Trace> {
        let mut trace = trace_with_footprint(target, &state, self.formals);
        for actual in from_actuals {
            if let Some(raw) = actual.access_path() {
                let actual_ap = AbsAccessPath::Exact(raw.clone());
                let actual_trace = trace_with_footprint(&actual_ap, &state, self.formals);
                trace = trace.join(&actual_trace);
            }
        }

        let should_taint =
            |typ: &Typ| taint_all_types || self.spec.is_taintable_type(typ);
        let filtered: Vec<S::Source> = trace
            .sources()
            .into_iter()
            .filter(|source| match source.footprint_path() {
                Some(footprint_ap) => should_taint(footprint_ap.typ()),
                None => true,
            })
            .collect();

        if filtered.is_empty() {
            return state;
        }
        state.add_trace(target, trace.update_sources(filtered));
        state
    }
}
