//! Interprocedural access-path taint analysis.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{analyze_program, AnalysisReport};
pub use domain::{
    FlowSink, FlowSource, FlowTrace, ProcSummary, ReportablePath, SinkKind, SourceKind,
    TraceDomain,
};
pub use infrastructure::{
    CheckerOutcome, InMemorySummaryStore, Issue, TaintChecker, TaintTree, TreeNode,
};
pub use ports::{PropagationRule, SinkDecl, SourceDecl, SummaryAccess, TaintSpec};
