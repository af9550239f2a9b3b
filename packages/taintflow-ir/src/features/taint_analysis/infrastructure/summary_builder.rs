/*
 * Summary Construction
 *
 * Compresses the post-state of a procedure into a summary a caller can
 * instantiate. Two stages:
 *
 * Stage A: every node whose trace reached a sink gets joined into the
 * node at each of its footprint sources' paths, so a sink reachable
 * from input i is recorded where input i lives.
 *
 * Stage B: re-key the tree by formal index. Globals and the return
 * base stay as they are; formal bases become their footprint variable;
 * locals disappear. Empty footprint entries are pruned; footprint
 * entries without sinks keep their subtree but drop their trace,
 * preserving the shape of downstream fields without claiming flows
 * that do not exist. The return base is kept even when it only holds a
 * footprint source, since that is exactly how passthrough behavior is
 * published to callers.
 */

use super::access_tree::{TaintTree, TreeNode};
use super::formal_map::FormalMap;
use crate::features::program_model::domain::Procedure;
use crate::features::taint_analysis::domain::summary::ProcSummary;
use crate::features::taint_analysis::domain::trace::{SourceKind, TraceDomain};
use crate::features::taint_analysis::ports::TaintSpec;
use crate::shared::models::{Base, Var};

/// Build the summary of `proc` from its fixpoint post-state.
pub fn make_summary<S: TaintSpec>(
    spec: &S,
    proc: &Procedure,
    formals: &FormalMap,
    post: TaintTree<S::Trace>,
) -> ProcSummary<S::Trace> {
    let with_footprints = reattach_footprint_sinks(post);
    let rekeyed = rekey_by_formal_index::<S::Trace>(with_footprints, proc, formals);
    spec.to_summary_tree(rekeyed)
}

/// Stage A: record sink-carrying nodes at their footprint origins.
fn reattach_footprint_sinks<T: TraceDomain>(tree: TaintTree<T>) -> TaintTree<T> {
    tree.fold(tree.clone(), |mut acc, _ap, node| {
        if node.trace.sinks().is_empty() {
            return acc;
        }
        for source in node.trace.sources() {
            if let Some(footprint_ap) = source.footprint_path() {
                acc.add_node(footprint_ap, node.clone());
            }
        }
        acc
    })
}

/// Stage B: express the tree over globals, the return slot, and
/// formal-indexed footprint variables only.
fn rekey_by_formal_index<T: TraceDomain>(
    tree: TaintTree<T>,
    proc: &Procedure,
    formals: &FormalMap,
) -> TaintTree<T> {
    let is_managed = proc.pname.language.is_managed();
    let mut out = TaintTree::new();

    for base in tree.bases() {
        let node = match tree.base_node(&base) {
            Some(node) => node.clone(),
            None => continue,
        };

        if base.var.is_global() || base.var.is_return() {
            insert_joined(&mut out, base, node);
        } else if base.var.footprint_index().is_some() {
            if node_is_empty(&node, is_managed) {
                continue;
            }
            let node = if node.trace.sinks().is_empty() {
                TreeNode {
                    trace: T::empty(),
                    subtree: node.subtree,
                }
            } else {
                node
            };
            insert_joined(&mut out, base, node);
        } else if let Some(index) = formals.formal_index(&base) {
            let footprint_base = Base::new(Var::footprint(index), base.typ.clone());
            let joined = match out.remove_base(&footprint_base) {
                Some(existing) => TreeNode::join(&existing, &node),
                None => node,
            };
            if node_is_empty(&joined, is_managed) {
                continue;
            }
            out.insert_base(footprint_base, joined);
        }
        // Anything else is a local; callers cannot name it.
    }
    out
}

fn insert_joined<T: TraceDomain>(tree: &mut TaintTree<T>, base: Base, node: TreeNode<T>) {
    let merged = match tree.remove_base(&base) {
        Some(existing) => TreeNode::join(&existing, &node),
        None => node,
    };
    tree.insert_base(base, merged);
}

/// A node carries nothing worth publishing: for managed languages a
/// trace without sinks, otherwise a fully empty trace, and no concrete
/// children either way.
fn node_is_empty<T: TraceDomain>(node: &TreeNode<T>, is_managed: bool) -> bool {
    let trace_empty = if is_managed {
        node.trace.sinks().is_empty()
    } else {
        node.trace.is_empty()
    };
    trace_empty && node.subtree.has_no_entries()
}
