//! Application module
//!
//! Wires the NUT client and the Kubernetes node store into the domain and
//! drives evaluation cycles.

pub mod cycle;
pub mod daemon;

pub use cycle::CycleError;
pub use cycle::CycleReport;
pub use cycle::Evaluator;
