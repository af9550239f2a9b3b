//! Vertical feature slices.

pub mod dataflow;
pub mod program_model;
pub mod taint_analysis;
