/*
 * Worklist Fixpoint Solver
 *
 * Classic forward dataflow over a join semilattice (Kildall).
 *
 * Algorithm:
 * 1. Seed the entry node with the initial state
 * 2. Pop a node; its in-state is the join of predecessor out-states
 *    (or the initial state at entry)
 * 3. Run the transfer function over the node's instructions
 * 4. If the out-state grew, re-enqueue the successors
 * 5. The post is the out-state at the exit node once the worklist drains
 *
 * Termination relies on join being monotone and the domain having finite
 * ascending chains; an iteration bound guards against domains that do
 * not.
 */

use rustc_hash::FxHashMap;
use std::collections::VecDeque;

use crate::errors::{Result, TaintflowError};
use crate::features::program_model::domain::{HilInstruction, NodeId, ProcCfg};

/// Join-semilattice state tracked per CFG node.
pub trait AbstractDomain: Clone {
    /// Least upper bound
    fn join(&self, other: &Self) -> Self;

    /// Partial order test: `self` contains at most the information of
    /// `other`
    fn leq(&self, other: &Self) -> bool;
}

/// Instruction interpretation for one analysis.
///
/// Must be pure in the state argument: same pre-state and instruction,
/// same post-state. Side channels (reports) go through the implementor's
/// own collector, never through the state.
pub trait TransferFunctions {
    type Domain: AbstractDomain;

    fn exec_instr(
        &self,
        pre: Self::Domain,
        instr: &HilInstruction,
        node: NodeId,
    ) -> Result<Self::Domain>;
}

/// Worklist solver computing the post-state at the procedure exit.
pub struct WorklistSolver {
    max_iterations: usize,
}

impl WorklistSolver {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    /// Iterate to fixpoint. Returns the exit node's out-state, or `None`
    /// for a procedure whose entry has no successors (no body to run).
    pub fn compute_post<T: TransferFunctions>(
        &self,
        cfg: &ProcCfg,
        transfer: &T,
        initial: T::Domain,
        proc_name: &str,
    ) -> Result<Option<T::Domain>> {
        if !cfg.entry_has_successors() && cfg.entry == cfg.exit {
            return Ok(None);
        }

        let mut out_states: FxHashMap<NodeId, T::Domain> = FxHashMap::default();
        let mut worklist: VecDeque<NodeId> = VecDeque::new();
        worklist.push_back(cfg.entry);

        let mut iterations = 0usize;
        while let Some(node_id) = worklist.pop_front() {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(TaintflowError::FixpointDiverged {
                    proc: proc_name.to_string(),
                    max_iterations: self.max_iterations,
                });
            }

            let in_state = self.in_state::<T>(cfg, node_id, &out_states, &initial);
            let in_state = match in_state {
                Some(state) => state,
                // No predecessor has produced a state yet; revisit once
                // one has.
                None => continue,
            };

            let node = match cfg.node(node_id) {
                Some(node) => node,
                None => continue,
            };

            let mut post = in_state;
            for instr in &node.instrs {
                post = transfer.exec_instr(post, instr, node_id)?;
            }

            let grew = match out_states.get(&node_id) {
                Some(old) => !post.leq(old),
                None => true,
            };
            if grew {
                let merged = match out_states.remove(&node_id) {
                    Some(old) => old.join(&post),
                    None => post,
                };
                out_states.insert(node_id, merged);
                for &succ in cfg.succs(node_id) {
                    if !worklist.contains(&succ) {
                        worklist.push_back(succ);
                    }
                }
            }
        }

        Ok(out_states.remove(&cfg.exit))
    }

    fn in_state<T: TransferFunctions>(
        &self,
        cfg: &ProcCfg,
        node_id: NodeId,
        out_states: &FxHashMap<NodeId, T::Domain>,
        initial: &T::Domain,
    ) -> Option<T::Domain> {
        if node_id == cfg.entry {
            return Some(initial.clone());
        }
        let mut acc: Option<T::Domain> = None;
        for pred in cfg.preds(node_id) {
            if let Some(state) = out_states.get(pred) {
                acc = Some(match acc {
                    Some(cur) => cur.join(state),
                    None => state.clone(),
                });
            }
        }
        acc
    }
}
