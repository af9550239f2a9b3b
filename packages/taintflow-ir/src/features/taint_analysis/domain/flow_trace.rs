//! Default trace domain.
//!
//! `FlowTrace` keeps three finite sets: labeled sources, labeled sinks,
//! and the passthrough call sites a value crossed between them. Join is
//! pointwise union, so the lattice is finite per procedure and the
//! fixpoint terminates.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::trace::{ReportablePath, SinkKind, SourceKind, TraceDomain};
use crate::features::program_model::domain::ProcName;
use crate::shared::models::{AbsAccessPath, CallSite};

/// Bound on expanding intermediate sinks through callee summaries while
/// reporting.
const MAX_SINK_EXPANSION_DEPTH: usize = 10;

/// A source: either a labeled call or a symbolic input footprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowSource {
    /// Value produced by a call the taint spec labeled, e.g. "UserInput"
    Call { kind: String, site: CallSite },

    /// Unknown input value of a formal or global
    Footprint(AbsAccessPath),
}

impl FlowSource {
    pub fn call(kind: impl Into<String>, site: CallSite) -> Self {
        FlowSource::Call {
            kind: kind.into(),
            site,
        }
    }
}

impl SourceKind for FlowSource {
    fn footprint(path: AbsAccessPath) -> Self {
        FlowSource::Footprint(path)
    }

    fn footprint_path(&self) -> Option<&AbsAccessPath> {
        match self {
            FlowSource::Footprint(path) => Some(path),
            FlowSource::Call { .. } => None,
        }
    }

    fn call_site(&self) -> Option<&CallSite> {
        match self {
            FlowSource::Call { site, .. } => Some(site),
            FlowSource::Footprint(_) => None,
        }
    }
}

impl fmt::Display for FlowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowSource::Call { kind, site } => write!(f, "{}({})", kind, site.pname),
            FlowSource::Footprint(path) => write!(f, "input({})", path),
        }
    }
}

/// A sink: a labeled dangerous call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowSink {
    pub kind: String,
    pub site: CallSite,
}

impl FlowSink {
    pub fn new(kind: impl Into<String>, site: CallSite) -> Self {
        Self {
            kind: kind.into(),
            site,
        }
    }
}

impl SinkKind for FlowSink {
    fn call_site(&self) -> &CallSite {
        &self.site
    }
}

impl fmt::Display for FlowSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.site.pname)
    }
}

/// Call site a tainted value passed through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Passthrough {
    pub site: CallSite,
}

/// Default (sources, sinks, passthroughs) trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTrace {
    sources: FxHashSet<FlowSource>,
    sinks: FxHashSet<FlowSink>,
    passthroughs: FxHashSet<Passthrough>,
}

impl FlowTrace {
    pub fn passthrough_sites(&self) -> Vec<CallSite> {
        let mut sites: Vec<_> = self.passthroughs.iter().map(|p| p.site.clone()).collect();
        sites.sort();
        sites
    }

    fn sorted_sources(&self) -> Vec<FlowSource> {
        let mut sources: Vec<_> = self.sources.iter().cloned().collect();
        sources.sort_by_key(|s| format!("{:?}", s));
        sources
    }

    fn sorted_sinks(&self) -> Vec<FlowSink> {
        let mut sinks: Vec<_> = self.sinks.iter().cloned().collect();
        sinks.sort_by_key(|s| format!("{:?}", s));
        sinks
    }
}

impl TraceDomain for FlowTrace {
    type Source = FlowSource;
    type Sink = FlowSink;

    fn empty() -> Self {
        Self::default()
    }

    fn of_source(source: FlowSource) -> Self {
        let mut sources = FxHashSet::default();
        sources.insert(source);
        Self {
            sources,
            ..Self::default()
        }
    }

    fn add_source(&self, source: FlowSource) -> Self {
        let mut next = self.clone();
        next.sources.insert(source);
        next
    }

    fn add_sink(&self, sink: FlowSink) -> Self {
        let mut next = self.clone();
        next.sinks.insert(sink);
        next
    }

    fn sources(&self) -> Vec<FlowSource> {
        self.sorted_sources()
    }

    fn sinks(&self) -> Vec<FlowSink> {
        self.sorted_sinks()
    }

    fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.sinks.is_empty() && self.passthroughs.is_empty()
    }

    fn join(&self, other: &Self) -> Self {
        Self {
            sources: self.sources.union(&other.sources).cloned().collect(),
            sinks: self.sinks.union(&other.sinks).cloned().collect(),
            passthroughs: self
                .passthroughs
                .union(&other.passthroughs)
                .cloned()
                .collect(),
        }
    }

    fn leq(&self, other: &Self) -> bool {
        self.sources.is_subset(&other.sources)
            && self.sinks.is_subset(&other.sinks)
            && self.passthroughs.is_subset(&other.passthroughs)
    }

    fn update_sources(&self, sources: Vec<FlowSource>) -> Self {
        Self {
            sources: sources.into_iter().collect(),
            sinks: self.sinks.clone(),
            passthroughs: self.passthroughs.clone(),
        }
    }

    fn append(caller: &Self, callee: &Self, call_site: &CallSite) -> Self {
        if callee.is_empty() {
            return caller.clone();
        }
        let mut joined = caller.join(callee);
        joined.passthroughs.insert(Passthrough {
            site: call_site.clone(),
        });
        joined
    }

    fn reportable_paths(
        &self,
        _cur_site: &CallSite,
        resolver: &dyn Fn(&ProcName) -> Self,
    ) -> Vec<ReportablePath<FlowSource, FlowSink>> {
        let mut paths = Vec::new();
        for source in self.sorted_sources() {
            if source.footprint_path().is_some() {
                // Symbolic inputs only become reportable once a caller
                // instantiates them with a real source.
                continue;
            }
            for sink in self.sorted_sinks() {
                let (terminal, expansion) = expand_sink(sink.clone(), resolver);
                let mut passthroughs = self.passthrough_sites();
                passthroughs.extend(expansion);
                paths.push(ReportablePath {
                    source: source.clone(),
                    sink: terminal,
                    passthroughs,
                });
            }
        }
        paths
    }
}

/// Follow a sink into callee summaries: when the sink's procedure has a
/// summary trace with a deeper sink, the flow continues there. Depth is
/// bounded and cycles stop at the first repeated sink.
fn expand_sink(
    mut sink: FlowSink,
    resolver: &dyn Fn(&ProcName) -> FlowTrace,
) -> (FlowSink, Vec<CallSite>) {
    let mut intermediates = Vec::new();
    for _ in 0..MAX_SINK_EXPANSION_DEPTH {
        let callee_trace = resolver(&sink.site.pname);
        let deeper = callee_trace.sorted_sinks().into_iter().find(|s| *s != sink);
        match deeper {
            Some(next) => {
                intermediates.push(sink.site.clone());
                sink = next;
            }
            None => break,
        }
    }
    (sink, intermediates)
}

impl fmt::Display for FlowTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sources: [")?;
        for (i, source) in self.sorted_sources().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", source)?;
        }
        write!(f, "], sinks: [")?;
        for (i, sink) in self.sorted_sinks().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", sink)?;
        }
        write!(f, "]")
    }
}
