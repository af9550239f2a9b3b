//! Per-procedure control flow graph over high-level instructions.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::hil::HilInstruction;

/// Identifier of a CFG node within one procedure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct NodeId(pub u32);

/// One CFG node: a straight-line instruction sequence plus edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CfgNode {
    pub instrs: Vec<HilInstruction>,
    pub succs: Vec<NodeId>,
    pub preds: Vec<NodeId>,
}

/// Control flow graph of a procedure.
///
/// Built through [`CfgBuilder`]; the entry and exit nodes always exist,
/// and predecessor lists are derived from successor lists at build time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcCfg {
    pub nodes: FxHashMap<NodeId, CfgNode>,
    pub entry: NodeId,
    pub exit: NodeId,
}

impl ProcCfg {
    pub fn node(&self, id: NodeId) -> Option<&CfgNode> {
        self.nodes.get(&id)
    }

    pub fn succs(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.succs.as_slice()).unwrap_or(&[])
    }

    pub fn preds(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.preds.as_slice()).unwrap_or(&[])
    }

    /// True when the entry node has at least one successor, i.e. the
    /// procedure has a body.
    pub fn entry_has_successors(&self) -> bool {
        !self.succs(self.entry).is_empty()
    }

    /// Every call instruction in the graph, in node-id order.
    pub fn call_instructions(&self) -> Vec<&HilInstruction> {
        let mut ids: Vec<_> = self.nodes.keys().copied().collect();
        ids.sort();
        ids.iter()
            .flat_map(|id| &self.nodes[id].instrs)
            .filter(|instr| matches!(instr, HilInstruction::Call { .. }))
            .collect()
    }
}

/// Incremental CFG construction.
#[derive(Debug, Default)]
pub struct CfgBuilder {
    nodes: FxHashMap<NodeId, CfgNode>,
    next_id: u32,
}

impl CfgBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, instrs: Vec<HilInstruction>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            CfgNode {
                instrs,
                succs: Vec::new(),
                preds: Vec::new(),
            },
        );
        id
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        if let Some(node) = self.nodes.get_mut(&from) {
            if !node.succs.contains(&to) {
                node.succs.push(to);
            }
        }
        if let Some(node) = self.nodes.get_mut(&to) {
            if !node.preds.contains(&from) {
                node.preds.push(from);
            }
        }
    }

    pub fn build(self, entry: NodeId, exit: NodeId) -> ProcCfg {
        ProcCfg {
            nodes: self.nodes,
            entry,
            exit,
        }
    }

    /// Straight-line graph: entry, one body node per instruction list,
    /// exit.
    pub fn linear(instr_blocks: Vec<Vec<HilInstruction>>) -> ProcCfg {
        let mut builder = Self::new();
        let entry = builder.add_node(Vec::new());
        let mut prev = entry;
        for block in instr_blocks {
            let node = builder.add_node(block);
            builder.add_edge(prev, node);
            prev = node;
        }
        let exit = builder.add_node(Vec::new());
        builder.add_edge(prev, exit);
        builder.build(entry, exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::Loc;

    #[test]
    fn test_linear_graph_shape() {
        let cfg = CfgBuilder::linear(vec![
            vec![HilInstruction::Metadata { loc: Loc::line(1) }],
            vec![HilInstruction::Metadata { loc: Loc::line(2) }],
        ]);

        assert!(cfg.entry_has_successors());
        assert_eq!(cfg.succs(cfg.entry).len(), 1);
        assert!(cfg.succs(cfg.exit).is_empty());

        let mut reached = vec![cfg.entry];
        let mut cur = cfg.entry;
        while let Some(&next) = cfg.succs(cur).first() {
            reached.push(next);
            cur = next;
        }
        assert_eq!(*reached.last().unwrap(), cfg.exit);
        assert_eq!(reached.len(), 4);
    }

    #[test]
    fn test_empty_procedure_has_no_successors() {
        let mut builder = CfgBuilder::new();
        let entry = builder.add_node(Vec::new());
        let cfg = builder.build(entry, entry);
        assert!(!cfg.entry_has_successors());
    }

    #[test]
    fn test_preds_mirror_succs() {
        let mut builder = CfgBuilder::new();
        let a = builder.add_node(Vec::new());
        let b = builder.add_node(Vec::new());
        let c = builder.add_node(Vec::new());
        builder.add_edge(a, b);
        builder.add_edge(a, c);
        builder.add_edge(b, c);
        let cfg = builder.build(a, c);

        assert_eq!(cfg.preds(c), &[a, b]);
        assert_eq!(cfg.succs(a), &[b, c]);
    }
}
