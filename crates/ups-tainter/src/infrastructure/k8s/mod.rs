//! Kubernetes integration module.
//!
//! Nodes are associated with a UPS through a label and are tainted according
//! to the state of that UPS. The main components are:
//! - [`KubeNodeStore`]: lists labelled nodes and replaces their taints
//! - [`KubernetesError`]: error kinds, split between listing and patching

pub mod node_store;
pub mod types;

pub use node_store::KubeNodeStore;
pub use types::KubernetesError;
