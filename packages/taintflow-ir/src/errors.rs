//! Error types for taintflow-ir
//!
//! Spec-authoring mistakes and analyzer invariant violations fail fast
//! with a structured variant; recoverable semantic gaps are logged and
//! skipped at the point where they occur.

use thiserror::Error;

/// Main error type for taintflow-ir operations
#[derive(Debug, Error)]
pub enum TaintflowError {
    /// A source or sink declaration points at an actual the call does
    /// not have
    #[error(
        "taint spec references actual #{index} of {callee}, but the call has {actual_count} actuals"
    )]
    MalformedSpecIndex {
        callee: String,
        index: usize,
        actual_count: usize,
    },

    /// A callee summary carries a return trace but the call site binds
    /// no return slot
    #[error("summary for {callee} has a return trace but the call site provides no return slot")]
    ReturnBindingMissing { callee: String },

    /// An `operator=` call did not match the two-actual assignment shape
    #[error("unexpected assignment-operator call shape: {instr}")]
    UnexpectedAssignmentOperator { instr: String },

    /// The fixpoint produced no post state although the entry node has
    /// successors
    #[error("no post state for {proc} although its entry node has successors")]
    MissingPost { proc: String },

    /// The worklist did not stabilize within the configured bound
    #[error("fixpoint for {proc} did not converge within {max_iterations} iterations")]
    FixpointDiverged { proc: String, max_iterations: usize },

    /// Endpoint configuration could not be read or parsed
    #[error("endpoint configuration {path}: {message}")]
    EndpointConfig { path: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for taintflow operations
pub type Result<T> = std::result::Result<T, TaintflowError>;
