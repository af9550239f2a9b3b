/*
 * Summary Application
 *
 * Grafts a callee summary onto the caller state at a call site. A
 * summary speaks about footprint variables (indexed formals), the
 * return slot, and globals; application translates each of those into
 * the caller's vocabulary:
 *
 * - the return base rebases onto the call's return slot,
 * - footprint(i) projects onto the i-th actual (steps appended,
 *   exactness preserved),
 * - globals pass through unchanged.
 *
 * Callee traces holding footprint sources are instantiated by looking
 * the translated paths up in the caller state and joining what is
 * found, replacing the symbolic placeholders with the caller's actual
 * provenance.
 */

use tracing::debug;

use super::access_tree::{TaintTree, TreeNode};
use super::footprint::{lookup_with_footprint, trace_with_footprint};
use super::formal_map::FormalMap;
use super::reporting::Reporter;
use crate::errors::{Result, TaintflowError};
use crate::features::program_model::domain::HilExpr;
use crate::features::taint_analysis::domain::summary::ProcSummary;
use crate::features::taint_analysis::domain::trace::{SourceKind, TraceDomain};
use crate::shared::models::{AbsAccessPath, AccessPath, Base, CallSite};

/// Caller-side context a summary is applied in.
pub struct ApplyCtx<'a, T: TraceDomain> {
    pub ret: Option<&'a Base>,
    pub actuals: &'a [HilExpr],
    pub caller_formals: &'a FormalMap,
    pub reporter: &'a Reporter<'a, T>,
    pub call_site: &'a CallSite,
}

/// Apply `summary` to `state`, returning the caller post-state.
pub fn apply_summary<T: TraceDomain>(
    state: TaintTree<T>,
    summary: &ProcSummary<T>,
    ctx: &ApplyCtx<'_, T>,
) -> Result<TaintTree<T>> {
    summary.tree().fold(Ok(state), |acc, callee_ap, callee_node| {
        let mut state = acc?;
        if callee_node.is_bottom() {
            // Structural entries (intermediate nodes, empty return
            // slots) carry nothing to graft. Children are visited on
            // their own.
            return Ok(state);
        }
        let caller_ap = to_caller(callee_ap, ctx)?;
        match caller_ap {
            None => {
                // The contribution has no caller location (the actual
                // was not an access path), but its instantiated trace
                // can still complete a flow worth reporting.
                let instantiated = instantiate_trace(&callee_node.trace, &state, ctx)?;
                let appended = T::append(&T::empty(), &instantiated, ctx.call_site);
                ctx.reporter.report_trace(&appended, ctx.call_site);
                Ok(state)
            }
            Some(caller_ap) => {
                let caller_node =
                    lookup_with_footprint(&caller_ap, &state, ctx.caller_formals)
                        .unwrap_or_else(TreeNode::empty);
                let instantiated = instantiate_trace(&callee_node.trace, &state, ctx)?;
                let appended = T::append(&caller_node.trace, &instantiated, ctx.call_site);
                ctx.reporter.report_trace(&appended, ctx.call_site);
                state.add_node(
                    &caller_ap,
                    TreeNode {
                        trace: appended,
                        subtree: caller_node.subtree,
                    },
                );
                Ok(state)
            }
        }
    })
}

/// Translate a summary access path into the caller's vocabulary.
///
/// `Ok(None)` means the contribution has no caller-side location and is
/// dropped; an unbound return slot is a caller bug and fails fast.
fn to_caller<T: TraceDomain>(
    formal_ap: &AbsAccessPath,
    ctx: &ApplyCtx<'_, T>,
) -> Result<Option<AbsAccessPath>> {
    let (base, steps) = formal_ap.extract();

    if base.var.is_return() {
        let ret = ctx.ret.ok_or_else(|| TaintflowError::ReturnBindingMissing {
            callee: ctx.call_site.pname.to_string(),
        })?;
        return Ok(Some(
            formal_ap.map_raw(formal_ap.raw().with_base(ret.clone())),
        ));
    }

    if let Some(formal_index) = base.var.footprint_index() {
        let actual_ap = ctx
            .actuals
            .get(formal_index)
            .and_then(|actual| actual.access_path());
        return match actual_ap {
            Some(actual_ap) => {
                let projected = AccessPath::append(actual_ap, steps);
                Ok(Some(formal_ap.map_raw(projected)))
            }
            None => {
                debug!(
                    "dropping summary contribution for {}: actual #{} of {} is not an access path",
                    formal_ap, formal_index, ctx.call_site.pname
                );
                Ok(None)
            }
        };
    }

    // Globals already name a caller-visible location.
    Ok(Some(formal_ap.clone()))
}

/// Replace the footprint sources of a callee trace with the caller
/// traces found at their translated paths.
fn instantiate_trace<T: TraceDomain>(
    callee_trace: &T,
    caller_tree: &TaintTree<T>,
    ctx: &ApplyCtx<'_, T>,
) -> Result<T> {
    let mut concrete_sources = Vec::new();
    let mut caller_context = T::empty();
    let mut saw_footprint = false;

    for source in callee_trace.sources() {
        match source.footprint_path().cloned() {
            Some(footprint_ap) => {
                saw_footprint = true;
                if let Some(caller_ap) = to_caller(&footprint_ap, ctx)? {
                    let caller_trace =
                        trace_with_footprint(&caller_ap, caller_tree, ctx.caller_formals);
                    caller_context = caller_context.join(&caller_trace);
                }
            }
            None => concrete_sources.push(source),
        }
    }

    if !saw_footprint {
        return Ok(callee_trace.clone());
    }
    Ok(callee_trace
        .update_sources(concrete_sources)
        .join(&caller_context))
}
