//! Trace domain interface.
//!
//! A trace is the lattice element stored at each access path: which
//! sources reach the path, which sinks the path has reached, and the
//! call sites the value passed through on the way. The concrete carrier
//! is chosen by the taint specification; [`super::flow_trace::FlowTrace`]
//! is the default.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::features::program_model::domain::ProcName;
use crate::shared::models::{AbsAccessPath, CallSite, Loc};

/// A taint source instance.
pub trait SourceKind: Clone + Eq + Hash + Debug + Display {
    /// Symbolic source standing for the unknown input value at `path`.
    fn footprint(path: AbsAccessPath) -> Self;

    /// `Some` iff this source is a symbolic input; the path it covers.
    fn footprint_path(&self) -> Option<&AbsAccessPath>;

    /// Call site that produced the value, `None` for symbolic inputs.
    fn call_site(&self) -> Option<&CallSite>;
}

/// A taint sink instance.
pub trait SinkKind: Clone + Eq + Hash + Debug + Display {
    fn call_site(&self) -> &CallSite;
}

/// One complete source-to-sink flow extracted from a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportablePath<S, K> {
    pub source: S,
    pub sink: K,

    /// Call sites the value passed through between source and sink
    pub passthroughs: Vec<CallSite>,
}

impl<S: SourceKind, K: SinkKind> ReportablePath<S, K> {
    /// Locations of the flow, source first.
    pub fn to_loc_trace(&self) -> Vec<Loc> {
        let mut locs = Vec::with_capacity(self.passthroughs.len() + 2);
        if let Some(site) = self.source.call_site() {
            locs.push(site.loc);
        }
        locs.extend(self.passthroughs.iter().map(|site| site.loc));
        locs.push(self.sink.call_site().loc);
        locs
    }
}

/// Lattice of (sources, sinks, passthroughs).
///
/// All updates are functional; a trace stored in an access tree is only
/// ever replaced, never mutated in place.
pub trait TraceDomain: Clone + PartialEq + Debug + Display {
    type Source: SourceKind;
    type Sink: SinkKind;

    fn empty() -> Self;

    fn of_source(source: Self::Source) -> Self;

    fn add_source(&self, source: Self::Source) -> Self;

    fn add_sink(&self, sink: Self::Sink) -> Self;

    fn sources(&self) -> Vec<Self::Source>;

    fn sinks(&self) -> Vec<Self::Sink>;

    fn is_empty(&self) -> bool;

    /// Lattice join
    fn join(&self, other: &Self) -> Self;

    /// `self` carries at most the information of `other`
    fn leq(&self, other: &Self) -> bool;

    /// Replace the source set, keeping sinks and passthroughs.
    fn update_sources(&self, sources: Vec<Self::Source>) -> Self;

    /// Extend a caller trace with a callee trace observed at
    /// `call_site`.
    fn append(caller: &Self, callee: &Self, call_site: &CallSite) -> Self;

    /// Enumerate complete source-to-sink flows. `resolver` maps a
    /// procedure name to its summary trace so intermediate sinks can be
    /// expanded; it must return the empty trace for the procedure
    /// currently under analysis.
    fn reportable_paths(
        &self,
        cur_site: &CallSite,
        resolver: &dyn Fn(&ProcName) -> Self,
    ) -> Vec<ReportablePath<Self::Source, Self::Sink>>;
}
