//! Taint analysis domain: traces, the default flow trace, summaries.

pub mod flow_trace;
pub mod summary;
pub mod trace;

pub use flow_trace::{FlowSink, FlowSource, FlowTrace, Passthrough};
pub use summary::ProcSummary;
pub use trace::{ReportablePath, SinkKind, SourceKind, TraceDomain};
