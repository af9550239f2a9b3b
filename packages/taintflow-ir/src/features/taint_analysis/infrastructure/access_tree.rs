/*
 * Access Tree
 *
 * Per-procedure abstract state: a map from typed variable bases to trie
 * nodes, where each node holds the trace reaching that access path and
 * a subtree over further field/index steps. A subtree is either a
 * finite step map or Star, which stands for every extension of the
 * path.
 *
 * Join is pointwise node join. Joining Star with a finite subtree
 * collapses the finite side's traces into the starred node so that no
 * child is left unreachable below a Star.
 */

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::features::taint_analysis::domain::trace::TraceDomain;
use crate::shared::models::{AbsAccessPath, AccessPath, Base, PathStep};

/// Children of an access tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Subtree<T> {
    /// Any extension of the path; the node's trace covers all of them
    Star,

    /// Finite step map
    Tree(FxHashMap<PathStep, TreeNode<T>>),
}

impl<T: TraceDomain> Subtree<T> {
    pub fn empty() -> Self {
        Subtree::Tree(FxHashMap::default())
    }

    /// No concrete children. Star has none by construction.
    pub fn has_no_entries(&self) -> bool {
        match self {
            Subtree::Star => true,
            Subtree::Tree(map) => map.is_empty(),
        }
    }
}

/// One node: the trace at a path plus the subtree below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode<T> {
    pub trace: T,
    pub subtree: Subtree<T>,
}

impl<T: TraceDomain> TreeNode<T> {
    pub fn empty() -> Self {
        Self {
            trace: T::empty(),
            subtree: Subtree::empty(),
        }
    }

    /// Leaf with a finite (empty) subtree.
    pub fn normal_leaf(trace: T) -> Self {
        Self {
            trace,
            subtree: Subtree::empty(),
        }
    }

    /// Leaf covering every extension of its path.
    pub fn starred_leaf(trace: T) -> Self {
        Self {
            trace,
            subtree: Subtree::Star,
        }
    }

    /// Empty trace and no concrete children. A bare Star over an empty
    /// trace carries no information either.
    pub fn is_bottom(&self) -> bool {
        self.trace.is_empty() && self.subtree.has_no_entries()
    }

    /// Join of the node's trace with every trace in its subtree.
    pub fn collapsed_trace(&self) -> T {
        let mut acc = self.trace.clone();
        collect_subtree_traces(&self.subtree, &mut acc);
        acc
    }

    /// Pointwise node join. Star wins over a finite subtree; the finite
    /// side's traces are folded into the starred node.
    pub fn join(lhs: &Self, rhs: &Self) -> Self {
        let trace = lhs.trace.join(&rhs.trace);
        match (&lhs.subtree, &rhs.subtree) {
            (Subtree::Star, Subtree::Star) => Self {
                trace,
                subtree: Subtree::Star,
            },
            (Subtree::Star, finite @ Subtree::Tree(_)) | (finite @ Subtree::Tree(_), Subtree::Star) => {
                let mut collapsed = trace;
                collect_subtree_traces(finite, &mut collapsed);
                Self {
                    trace: collapsed,
                    subtree: Subtree::Star,
                }
            }
            (Subtree::Tree(map1), Subtree::Tree(map2)) => {
                let mut merged = map1.clone();
                for (step, node) in map2 {
                    merged
                        .entry(step.clone())
                        .and_modify(|existing| *existing = Self::join(existing, node))
                        .or_insert_with(|| node.clone());
                }
                Self {
                    trace,
                    subtree: Subtree::Tree(merged),
                }
            }
        }
    }

    /// Does `lhs` carry at most the information of `rhs`?
    pub fn leq(lhs: &Self, rhs: &Self) -> bool {
        match (&lhs.subtree, &rhs.subtree) {
            (_, Subtree::Star) => lhs.collapsed_trace().leq(&rhs.trace),
            (Subtree::Star, Subtree::Tree(_)) => false,
            (Subtree::Tree(map1), Subtree::Tree(map2)) => {
                lhs.trace.leq(&rhs.trace)
                    && map1.iter().all(|(step, node)| {
                        map2.get(step).is_some_and(|other| Self::leq(node, other))
                    })
            }
        }
    }
}

fn collect_subtree_traces<T: TraceDomain>(subtree: &Subtree<T>, acc: &mut T) {
    if let Subtree::Tree(map) = subtree {
        for node in map.values() {
            *acc = acc.join(&node.trace);
            collect_subtree_traces(&node.subtree, acc);
        }
    }
}

/// The access-path to trace mapping of one procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaintTree<T> {
    map: FxHashMap<Base, TreeNode<T>>,
}

impl<T: TraceDomain> Default for TaintTree<T> {
    fn default() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }
}

impl<T: TraceDomain> TaintTree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn base_count(&self) -> usize {
        self.map.len()
    }

    /// Node stored directly at `base`, if any.
    pub fn base_node(&self, base: &Base) -> Option<&TreeNode<T>> {
        self.map.get(base)
    }

    /// Bases in deterministic order.
    pub fn bases(&self) -> Vec<Base> {
        let mut bases: Vec<_> = self.map.keys().cloned().collect();
        bases.sort();
        bases
    }

    pub fn insert_base(&mut self, base: Base, node: TreeNode<T>) {
        self.map.insert(base, node);
    }

    pub fn remove_base(&mut self, base: &Base) -> Option<TreeNode<T>> {
        self.map.remove(base)
    }

    /// Node at `ap`. A lookup that crosses a Star subtree answers with
    /// the starred node itself; an Abstracted query folds every trace
    /// below the found node into its trace.
    pub fn get_node(&self, ap: &AbsAccessPath) -> Option<TreeNode<T>> {
        let (base, steps) = ap.extract();
        let mut node = self.map.get(base)?;
        for step in steps {
            match &node.subtree {
                Subtree::Star => break,
                Subtree::Tree(map) => node = map.get(step)?,
            }
        }
        if ap.is_exact() {
            Some(node.clone())
        } else {
            Some(TreeNode {
                trace: node.collapsed_trace(),
                subtree: node.subtree.clone(),
            })
        }
    }

    /// Trace at `ap`, empty when absent.
    pub fn get_trace(&self, ap: &AbsAccessPath) -> T {
        self.get_node(ap).map(|node| node.trace).unwrap_or_else(T::empty)
    }

    /// Insert `node` at `ap`, joining with whatever is already there.
    /// Intermediate nodes are created empty. An Abstracted destination
    /// is starred and its subtree traces collapse into the node.
    pub fn add_node(&mut self, ap: &AbsAccessPath, node: TreeNode<T>) {
        let (base, steps) = ap.extract();
        let root = self
            .map
            .entry(base.clone())
            .or_insert_with(TreeNode::empty);
        add_below(root, steps, ap.is_exact(), node);
    }

    pub fn add_trace(&mut self, ap: &AbsAccessPath, trace: T) {
        self.add_node(ap, TreeNode::normal_leaf(trace));
    }

    /// Pointwise join.
    pub fn join(&self, other: &Self) -> Self {
        let mut merged = self.map.clone();
        for (base, node) in &other.map {
            merged
                .entry(base.clone())
                .and_modify(|existing| *existing = TreeNode::join(existing, node))
                .or_insert_with(|| node.clone());
        }
        Self { map: merged }
    }

    pub fn leq(&self, other: &Self) -> bool {
        self.map.iter().all(|(base, node)| {
            other
                .map
                .get(base)
                .is_some_and(|other_node| TreeNode::leq(node, other_node))
        })
    }

    /// Visit every (access path, node) pair, bases and steps in
    /// deterministic order. Nodes with a Star subtree are visited with
    /// an Abstracted path, all others with an Exact path.
    pub fn fold<A>(&self, init: A, mut f: impl FnMut(A, &AbsAccessPath, &TreeNode<T>) -> A) -> A {
        let mut acc = init;
        for base in self.bases() {
            let node = &self.map[&base];
            let raw = AccessPath::of_base(base.clone());
            acc = fold_node(acc, &raw, node, &mut f);
        }
        acc
    }
}

fn fold_node<T: TraceDomain, A>(
    mut acc: A,
    raw: &AccessPath,
    node: &TreeNode<T>,
    f: &mut impl FnMut(A, &AbsAccessPath, &TreeNode<T>) -> A,
) -> A {
    let ap = match node.subtree {
        Subtree::Star => AbsAccessPath::Abstracted(raw.clone()),
        Subtree::Tree(_) => AbsAccessPath::Exact(raw.clone()),
    };
    acc = f(acc, &ap, node);
    if let Subtree::Tree(map) = &node.subtree {
        let mut steps: Vec<_> = map.keys().cloned().collect();
        steps.sort();
        for step in steps {
            let child = &map[&step];
            let child_raw = AccessPath::append(raw, std::slice::from_ref(&step));
            acc = fold_node(acc, &child_raw, child, f);
        }
    }
    acc
}

fn add_below<T: TraceDomain>(
    cur: &mut TreeNode<T>,
    steps: &[PathStep],
    is_exact: bool,
    node: TreeNode<T>,
) {
    if steps.is_empty() {
        let joined = TreeNode::join(cur, &node);
        if is_exact {
            *cur = joined;
        } else {
            *cur = TreeNode::starred_leaf(joined.collapsed_trace());
        }
        return;
    }
    match &mut cur.subtree {
        Subtree::Star => {
            // Nothing lives below a Star; fold the incoming traces into
            // the starred node instead.
            cur.trace = cur.trace.join(&node.collapsed_trace());
        }
        Subtree::Tree(map) => {
            let child = map
                .entry(steps[0].clone())
                .or_insert_with(TreeNode::empty);
            add_below(child, &steps[1..], is_exact, node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::program_model::domain::{Language, ProcName};
    use crate::features::taint_analysis::domain::flow_trace::{FlowSource, FlowTrace};
    use crate::shared::models::{CallSite, Loc, Typ, Var};

    fn source_trace(name: &str, line: u32) -> FlowTrace {
        FlowTrace::of_source(FlowSource::call(
            "UserInput",
            CallSite::new(ProcName::plain(name, Language::Java), Loc::line(line)),
        ))
    }

    fn obj_path(steps: Vec<PathStep>) -> AccessPath {
        AccessPath::new(Base::new(Var::named("obj"), Typ::strukt("Obj")), steps)
    }

    fn field(name: &str) -> PathStep {
        PathStep::field(name, Typ::Str)
    }

    #[test]
    fn test_lookup_roundtrip() {
        let mut tree = TaintTree::new();
        let ap = AbsAccessPath::Exact(obj_path(vec![field("f")]));
        tree.add_trace(&ap, source_trace("src", 1));

        let node = tree.get_node(&ap).unwrap();
        assert_eq!(node.trace, source_trace("src", 1));

        // The intermediate base node exists with an empty trace.
        let base = AbsAccessPath::Exact(obj_path(vec![]));
        assert!(tree.get_node(&base).unwrap().trace.is_empty());
    }

    #[test]
    fn test_lookup_through_star_returns_star_root() {
        let mut tree = TaintTree::new();
        let starred = AbsAccessPath::Abstracted(obj_path(vec![]));
        tree.add_node(&starred, TreeNode::starred_leaf(source_trace("src", 1)));

        let deep = AbsAccessPath::Exact(obj_path(vec![field("f"), field("g")]));
        let node = tree.get_node(&deep).unwrap();
        assert_eq!(node.trace, source_trace("src", 1));
    }

    #[test]
    fn test_abstracted_lookup_joins_subtree() {
        let mut tree = TaintTree::new();
        tree.add_trace(
            &AbsAccessPath::Exact(obj_path(vec![field("f")])),
            source_trace("a", 1),
        );
        tree.add_trace(
            &AbsAccessPath::Exact(obj_path(vec![field("g")])),
            source_trace("b", 2),
        );

        let all = tree
            .get_node(&AbsAccessPath::Abstracted(obj_path(vec![])))
            .unwrap();
        assert_eq!(all.trace.sources().len(), 2);

        let exact = tree
            .get_node(&AbsAccessPath::Exact(obj_path(vec![])))
            .unwrap();
        assert!(exact.trace.is_empty());
    }

    #[test]
    fn test_abstracted_add_stars_and_collapses() {
        let mut tree = TaintTree::new();
        tree.add_trace(
            &AbsAccessPath::Exact(obj_path(vec![field("f")])),
            source_trace("a", 1),
        );
        tree.add_trace(&AbsAccessPath::Abstracted(obj_path(vec![])), source_trace("b", 2));

        let node = tree
            .get_node(&AbsAccessPath::Exact(obj_path(vec![])))
            .unwrap();
        assert!(matches!(node.subtree, Subtree::Star));
        // No children survive under the star; their traces moved up.
        assert_eq!(node.trace.sources().len(), 2);
    }

    #[test]
    fn test_add_below_star_folds_into_star() {
        let mut tree = TaintTree::new();
        tree.add_node(
            &AbsAccessPath::Abstracted(obj_path(vec![])),
            TreeNode::starred_leaf(source_trace("a", 1)),
        );
        tree.add_trace(
            &AbsAccessPath::Exact(obj_path(vec![field("f")])),
            source_trace("b", 2),
        );

        let node = tree
            .get_node(&AbsAccessPath::Exact(obj_path(vec![])))
            .unwrap();
        assert!(matches!(node.subtree, Subtree::Star));
        assert_eq!(node.trace.sources().len(), 2);
    }

    #[test]
    fn test_join_laws() {
        let mut t1 = TaintTree::new();
        t1.add_trace(
            &AbsAccessPath::Exact(obj_path(vec![field("f")])),
            source_trace("a", 1),
        );
        let mut t2 = TaintTree::new();
        t2.add_trace(
            &AbsAccessPath::Exact(obj_path(vec![field("g")])),
            source_trace("b", 2),
        );
        let mut t3 = TaintTree::new();
        t3.add_trace(&AbsAccessPath::Abstracted(obj_path(vec![])), source_trace("c", 3));

        // Idempotent, commutative, associative
        assert_eq!(t1.join(&t1), t1);
        assert_eq!(t1.join(&t2), t2.join(&t1));
        assert_eq!(t1.join(&t2).join(&t3), t1.join(&t2.join(&t3)));

        // Join is an upper bound
        assert!(t1.leq(&t1.join(&t2)));
        assert!(t2.leq(&t1.join(&t2)));
    }

    #[test]
    fn test_fold_visits_every_path() {
        let mut tree = TaintTree::new();
        tree.add_trace(
            &AbsAccessPath::Exact(obj_path(vec![field("f")])),
            source_trace("a", 1),
        );
        tree.add_trace(
            &AbsAccessPath::Exact(AccessPath::of_var(Var::named("x"), Typ::Int)),
            source_trace("b", 2),
        );

        let visited = tree.fold(Vec::new(), |mut acc, ap, _| {
            acc.push(ap.to_string());
            acc
        });
        assert_eq!(visited, vec!["obj", "obj.f", "x"]);
    }

    #[test]
    fn test_fold_marks_star_nodes_abstracted() {
        let mut tree = TaintTree::new();
        tree.add_node(
            &AbsAccessPath::Abstracted(obj_path(vec![])),
            TreeNode::starred_leaf(source_trace("a", 1)),
        );

        let flavors = tree.fold(Vec::new(), |mut acc, ap, _| {
            acc.push(ap.is_exact());
            acc
        });
        assert_eq!(flavors, vec![false]);
    }
}
