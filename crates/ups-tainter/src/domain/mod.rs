//! Status classification and taint reconciliation.
//!
//! Everything here is free of I/O: the outside world is reached through the
//! traits in [`traits`].

pub mod applier;
pub mod classifier;
#[cfg(test)]
pub(crate) mod mock;
pub mod reconciler;
pub mod traits;
pub mod types;

pub use applier::ApplyReport;
pub use applier::NodeOutcome;
pub use applier::NodeReport;
pub use applier::NodeTaintApplier;
pub use classifier::classify;
pub use reconciler::reconcile;
pub use reconciler::taints_equal;
pub use types::DesiredTaintState;
pub use types::NodeTaints;
pub use types::TaintEffect;
pub use types::TaintPolicy;
pub use types::TelemetrySnapshot;
