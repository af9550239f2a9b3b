//! Issue reporting.
//!
//! Whenever a trace gains a sink (directly or through a grafted
//! summary), every complete source-to-sink flow in it becomes one issue
//! keyed to the call site being interpreted. Sources whose producing
//! class is registered as an endpoint get an extra note, since flows
//! from externally callable entry points are the actionable ones.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::config::EndpointRegistry;
use crate::features::program_model::domain::ProcName;
use crate::features::taint_analysis::domain::trace::{SourceKind, TraceDomain};
use crate::features::taint_analysis::ports::SummaryAccess;
use crate::shared::models::{CallSite, Loc};

/// One reported source-to-sink flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub description: String,

    /// Call site the flow was observed at
    pub loc: Loc,
}

/// Per-procedure issue collector.
///
/// Holds the identity of the procedure being analyzed so that summary
/// resolution during reporting can never re-enter it.
pub struct Reporter<'a, T: TraceDomain> {
    current_proc: &'a ProcName,
    store: &'a dyn SummaryAccess<T>,
    issues: RefCell<Vec<Issue>>,
}

impl<'a, T: TraceDomain> Reporter<'a, T> {
    pub fn new(current_proc: &'a ProcName, store: &'a dyn SummaryAccess<T>) -> Self {
        Self {
            current_proc,
            store,
            issues: RefCell::new(Vec::new()),
        }
    }

    /// Emit one issue per reportable path in `trace`.
    pub fn report_trace(&self, trace: &T, cur_site: &CallSite) {
        let resolver = |pname: &ProcName| self.trace_of_pname(pname);
        for path in trace.reportable_paths(cur_site, &resolver) {
            let mut description = format!("{} -> {}", path.source, path.sink);
            if let Some(class) = self.endpoint_class_of(&path.source) {
                description.push_str(&format!(" (endpoint {})", class));
            }
            self.issues.borrow_mut().push(Issue {
                description,
                loc: cur_site.loc,
            });
        }
    }

    /// Summary trace of `pname`: the join of every trace in its stored
    /// summary. Always empty for the procedure currently being
    /// analyzed.
    pub fn trace_of_pname(&self, pname: &ProcName) -> T {
        if pname == self.current_proc {
            return T::empty();
        }
        match self.store.read_summary(self.current_proc, pname) {
            Some(summary) => summary
                .tree()
                .fold(T::empty(), |acc, _, node| acc.join(&node.trace)),
            None => T::empty(),
        }
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues.into_inner()
    }

    fn endpoint_class_of(&self, source: &T::Source) -> Option<String> {
        let site = source.call_site()?;
        let class = site.pname.class_name.as_deref()?;
        if EndpointRegistry::is_endpoint(class) {
            Some(class.to_string())
        } else {
            None
        }
    }
}
