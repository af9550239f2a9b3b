/*
 * taintflow-ir
 *
 * Generic interprocedural taint analyzer over a worklist
 * abstract-interpretation core.
 *
 * Architecture:
 * - shared/    : value models (locations, variables, types, access paths)
 * - features/  : vertical slices
 *     program_model  : procedures, high-level instructions, CFGs
 *     dataflow       : generic fixpoint solver
 *     taint_analysis : access trees, transfer function, summaries,
 *                      reporting, whole-program driver
 *
 * The analyzer is parameterized by a taint specification (which calls
 * produce, consume, and propagate taint) and computes one summary per
 * procedure: an access tree over formal-indexed footprint variables,
 * the return slot, and globals, instantiable at any call site.
 */

pub mod config;
pub mod errors;
pub mod features;
pub mod shared;

pub use config::{EndpointRegistry, TaintAnalysisConfig};
pub use errors::{Result, TaintflowError};
pub use features::dataflow::infrastructure::{AbstractDomain, TransferFunctions, WorklistSolver};
pub use features::program_model::domain::{
    CfgBuilder, HilExpr, HilInstruction, Language, Literal, NodeId, ProcCfg, ProcName, Procedure,
};
pub use features::program_model::ports::{DefaultLoweringQuirks, LoweringQuirks};
pub use features::taint_analysis::{
    analyze_program, AnalysisReport, CheckerOutcome, FlowSink, FlowSource, FlowTrace,
    InMemorySummaryStore, Issue, ProcSummary, PropagationRule, SinkDecl, SinkKind, SourceDecl,
    SourceKind, SummaryAccess, TaintChecker, TaintSpec, TaintTree, TraceDomain, TreeNode,
};
pub use shared::models::{AbsAccessPath, AccessPath, Base, CallSite, Loc, PathStep, Typ, Var};
