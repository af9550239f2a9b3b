/*
 * Whole-Program Driver
 *
 * Schedules per-procedure checks bottom-up over the call graph so that
 * callee summaries exist before their callers run:
 *
 * 1. Build a caller -> callee graph over the defined procedures
 * 2. Condense with Tarjan's SCC (components come out callees-first)
 * 3. Assign each component a level: one past the deepest callee level
 * 4. Analyze each level's procedures in parallel, then publish their
 *    summaries before the next level starts
 *
 * Procedures inside one cycle run without each other's summaries and
 * degrade to unknown-call handling at the recursive edges, matching the
 * store's refusal to serve a procedure its own in-progress summary.
 */

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TaintAnalysisConfig;
use crate::errors::Result;
use crate::features::program_model::domain::{HilInstruction, ProcName, Procedure};
use crate::features::program_model::ports::DefaultLoweringQuirks;
use crate::features::taint_analysis::infrastructure::checker::TaintChecker;
use crate::features::taint_analysis::infrastructure::reporting::Issue;
use crate::features::taint_analysis::infrastructure::summary_store::InMemorySummaryStore;
use crate::features::taint_analysis::ports::TaintSpec;

/// Aggregated result of a program analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// All issues, ordered by location then description
    pub issues: Vec<Issue>,

    pub procedures_analyzed: usize,

    pub summaries_written: usize,
}

/// Analyze every procedure bottom-up and return the report together
/// with the populated summary store.
pub fn analyze_program<S: TaintSpec>(
    spec: &S,
    procedures: &[Procedure],
    config: &TaintAnalysisConfig,
) -> Result<(AnalysisReport, InMemorySummaryStore<S::Trace>)>
where
    S::Trace: Send + Sync,
{
    let store: InMemorySummaryStore<S::Trace> = InMemorySummaryStore::new();
    let levels = schedule_levels(procedures);

    let mut report = AnalysisReport::default();
    for level in levels {
        debug!("analyzing level with {} procedures", level.len());
        let outcomes: Vec<_> = level
            .par_iter()
            .map(|&index| {
                let proc = &procedures[index];
                let checker = TaintChecker::new(spec, &store, &DefaultLoweringQuirks, config);
                checker.check(proc).map(|outcome| (proc, outcome))
            })
            .collect::<Result<Vec<_>>>()?;

        for (proc, outcome) in outcomes {
            report.procedures_analyzed += 1;
            report.issues.extend(outcome.issues);
            if let Some(summary) = outcome.summary {
                store.write(proc.pname.clone(), summary);
                report.summaries_written += 1;
            }
        }
    }

    report
        .issues
        .sort_by(|a, b| a.loc.cmp(&b.loc).then_with(|| a.description.cmp(&b.description)));
    Ok((report, store))
}

/// Group procedure indices into bottom-up levels: every callee of a
/// level-n procedure lives at a level below n (cycles share a level).
fn schedule_levels(procedures: &[Procedure]) -> Vec<Vec<usize>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let mut node_of_proc: FxHashMap<&ProcName, NodeIndex> = FxHashMap::default();

    for (index, proc) in procedures.iter().enumerate() {
        let node = graph.add_node(index);
        node_of_proc.insert(&proc.pname, node);
    }
    for proc in procedures {
        let caller = node_of_proc[&proc.pname];
        for instr in proc.cfg.call_instructions() {
            if let HilInstruction::Call {
                callee,
                dispatch_targets,
                ..
            } = instr
            {
                for target in std::iter::once(callee).chain(dispatch_targets.iter()) {
                    if let Some(&callee_node) = node_of_proc.get(target) {
                        if callee_node != caller {
                            graph.update_edge(caller, callee_node, ());
                        }
                    }
                }
            }
        }
    }

    // Components arrive callees-first, so each component's level only
    // depends on already-computed ones.
    let components = tarjan_scc(&graph);
    let mut component_of_node: FxHashMap<NodeIndex, usize> = FxHashMap::default();
    for (component_index, component) in components.iter().enumerate() {
        for &node in component {
            component_of_node.insert(node, component_index);
        }
    }

    let mut component_level = vec![0usize; components.len()];
    for (component_index, component) in components.iter().enumerate() {
        let mut level = 0usize;
        for &node in component {
            for callee in graph.neighbors(node) {
                let callee_component = component_of_node[&callee];
                if callee_component != component_index {
                    level = level.max(component_level[callee_component] + 1);
                }
            }
        }
        component_level[component_index] = level;
    }

    let max_level = component_level.iter().copied().max().unwrap_or(0);
    let mut levels: Vec<Vec<usize>> = vec![Vec::new(); max_level + 1];
    for (component_index, component) in components.iter().enumerate() {
        for &node in component {
            levels[component_level[component_index]].push(graph[node]);
        }
    }
    levels.retain(|level| !level.is_empty());
    for level in &mut levels {
        level.sort();
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::program_model::domain::{CfgBuilder, Language};
    use crate::shared::models::{Loc, Typ};

    fn call_to(name: &str, line: u32) -> HilInstruction {
        HilInstruction::Call {
            ret: None,
            callee: ProcName::plain(name, Language::Java),
            dispatch_targets: vec![],
            actuals: vec![],
            loc: Loc::line(line),
        }
    }

    fn proc_calling(name: &str, callees: &[&str]) -> Procedure {
        let calls = callees
            .iter()
            .enumerate()
            .map(|(i, callee)| call_to(callee, i as u32 + 1))
            .collect();
        Procedure::new(
            ProcName::plain(name, Language::Java),
            vec![],
            Typ::Void,
            CfgBuilder::linear(vec![calls]),
        )
    }

    #[test]
    fn test_callees_scheduled_before_callers() {
        let procs = vec![
            proc_calling("main", &["helper"]),
            proc_calling("helper", &["leaf"]),
            proc_calling("leaf", &[]),
        ];

        let levels = schedule_levels(&procs);
        let level_of = |index: usize| levels.iter().position(|l| l.contains(&index)).unwrap();
        assert!(level_of(2) < level_of(1));
        assert!(level_of(1) < level_of(0));
    }

    #[test]
    fn test_cycle_shares_a_level() {
        let procs = vec![
            proc_calling("ping", &["pong"]),
            proc_calling("pong", &["ping"]),
        ];

        let levels = schedule_levels(&procs);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0], vec![0, 1]);
    }

    #[test]
    fn test_unknown_callees_ignored_in_schedule() {
        let procs = vec![proc_calling("main", &["library_fn"])];
        let levels = schedule_levels(&procs);
        assert_eq!(levels, vec![vec![0]]);
    }
}
