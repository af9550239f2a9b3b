//! Footprint synthesis for unseen reads.
//!
//! A read of an access path the tree knows nothing about still carries
//! information when its root is a formal or a global: the value is
//! whatever the caller (or the environment) put there. Such reads get a
//! manufactured leaf whose trace holds a symbolic footprint source, to
//! be instantiated when a caller applies this procedure's summary.

use super::access_tree::{TaintTree, TreeNode};
use super::formal_map::FormalMap;
use crate::features::taint_analysis::domain::trace::{SourceKind, TraceDomain};
use crate::shared::models::AbsAccessPath;

/// Node at `ap`, manufacturing a footprint leaf on a miss.
///
/// A formal root yields a footprint re-rooted at the formal's index; a
/// global root yields a footprint over the path itself; anything else
/// (locals, plain temporaries) yields nothing.
pub fn lookup_with_footprint<T: TraceDomain>(
    ap: &AbsAccessPath,
    tree: &TaintTree<T>,
    formals: &FormalMap,
) -> Option<TreeNode<T>> {
    if let Some(node) = tree.get_node(ap) {
        return Some(node);
    }
    let root = ap.base();
    if let Some(formal_index) = formals.formal_index(root) {
        let footprint_ap = ap.to_footprint(formal_index);
        return Some(footprint_leaf(footprint_ap));
    }
    if root.var.is_global() {
        return Some(footprint_leaf(ap.clone()));
    }
    None
}

/// Trace at `ap`, with footprint fallback; empty when not even a
/// footprint applies.
pub fn trace_with_footprint<T: TraceDomain>(
    ap: &AbsAccessPath,
    tree: &TaintTree<T>,
    formals: &FormalMap,
) -> T {
    lookup_with_footprint(ap, tree, formals)
        .map(|node| node.trace)
        .unwrap_or_else(T::empty)
}

fn footprint_leaf<T: TraceDomain>(footprint_ap: AbsAccessPath) -> TreeNode<T> {
    TreeNode::normal_leaf(T::of_source(T::Source::footprint(footprint_ap)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::program_model::domain::{CfgBuilder, Language, ProcName, Procedure};
    use crate::features::taint_analysis::domain::flow_trace::FlowTrace;
    use crate::shared::models::{AccessPath, Base, PathStep, Typ, Var};

    fn formals() -> FormalMap {
        let proc = Procedure::new(
            ProcName::plain("f", Language::Java),
            vec![("a".to_string(), Typ::strukt("Obj"))],
            Typ::Void,
            CfgBuilder::linear(vec![]),
        );
        FormalMap::of_procedure(&proc)
    }

    #[test]
    fn test_formal_miss_manufactures_indexed_footprint() {
        let tree: TaintTree<FlowTrace> = TaintTree::new();
        let ap = AbsAccessPath::Exact(AccessPath::new(
            Base::new(Var::named("a"), Typ::strukt("Obj")),
            vec![PathStep::field("f", Typ::Str)],
        ));

        let node = lookup_with_footprint(&ap, &tree, &formals()).unwrap();
        let sources = node.trace.sources();
        assert_eq!(sources.len(), 1);
        let fp = sources[0].footprint_path().unwrap();
        assert_eq!(fp.base().var.footprint_index(), Some(0));
        // Trailing steps survive the re-rooting.
        assert_eq!(fp.raw().steps.len(), 1);
    }

    #[test]
    fn test_global_miss_keeps_original_path() {
        let tree: TaintTree<FlowTrace> = TaintTree::new();
        let ap = AbsAccessPath::Exact(AccessPath::of_var(Var::global("config"), Typ::Str));

        let node = lookup_with_footprint(&ap, &tree, &formals()).unwrap();
        let sources = node.trace.sources();
        let fp = sources[0].footprint_path().unwrap();
        assert!(fp.base().var.is_global());
    }

    #[test]
    fn test_local_miss_yields_nothing() {
        let tree: TaintTree<FlowTrace> = TaintTree::new();
        let ap = AbsAccessPath::Exact(AccessPath::of_var(Var::named("tmp"), Typ::Int));
        assert!(lookup_with_footprint(&ap, &tree, &formals()).is_none());
    }

    #[test]
    fn test_tree_hit_wins_over_fallback() {
        let mut tree: TaintTree<FlowTrace> = TaintTree::new();
        let ap = AbsAccessPath::Exact(AccessPath::of_var(Var::named("a"), Typ::strukt("Obj")));
        tree.add_trace(&ap, FlowTrace::empty());

        let node = lookup_with_footprint(&ap, &tree, &formals()).unwrap();
        assert!(node.trace.is_empty());
    }
}
