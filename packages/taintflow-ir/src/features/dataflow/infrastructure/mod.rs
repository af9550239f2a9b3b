pub mod fixpoint;

pub use fixpoint::{AbstractDomain, TransferFunctions, WorklistSolver};
