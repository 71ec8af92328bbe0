//! Applies a desired taint state to every node of a UPS.

use error_stack::Report;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::domain::reconciler;
use crate::domain::traits::NodeTaintStore;
use crate::domain::types::DesiredTaintState;

/// What happened to a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    /// Taints already matched the desired state.
    Unchanged,
    /// Taints were replaced.
    Patched,
    /// The patch was rejected; other nodes were still processed.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReport {
    pub node: String,
    pub outcome: NodeOutcome,
}

/// Result of applying one desired state to the nodes of one UPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub ups: String,
    pub desired: DesiredTaintState,
    pub nodes: Vec<NodeReport>,
}

impl ApplyReport {
    pub fn patched(&self) -> usize {
        self.count(|o| matches!(o, NodeOutcome::Patched))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, NodeOutcome::Failed { .. }))
    }

    fn count(&self, f: impl Fn(&NodeOutcome) -> bool) -> usize {
        self.nodes.iter().filter(|n| f(&n.outcome)).count()
    }
}

/// Reconciles and patches the nodes associated with a UPS.
pub struct NodeTaintApplier<S> {
    store: S,
    taint_key: String,
}

impl<S: NodeTaintStore> NodeTaintApplier<S> {
    pub fn new(store: S, taint_key: impl Into<String>) -> Self {
        Self {
            store,
            taint_key: taint_key.into(),
        }
    }

    /// Bring every node of `ups` in line with `desired`.
    ///
    /// Nodes are processed sequentially in listing order. A node whose
    /// taints already match is skipped.
    ///
    /// # Errors
    ///
    /// Fails only when the nodes cannot be listed. A failed patch is recorded
    /// as [`NodeOutcome::Failed`] and does not stop the remaining nodes.
    #[tracing::instrument(skip(self, desired), fields(desired = %desired))]
    pub async fn apply(
        &self,
        ups: &str,
        desired: &DesiredTaintState,
    ) -> Result<ApplyReport, Report<S::Error>> {
        let nodes = self.store.list_nodes(ups).await?;
        debug!(count = nodes.len(), "listed nodes");

        let mut reports = Vec::with_capacity(nodes.len());
        for node in nodes {
            let Some(taints) = reconciler::reconcile(&node.taints, desired, &self.taint_key) else {
                debug!(node = %node.name, "taints up to date");
                reports.push(NodeReport {
                    node: node.name,
                    outcome: NodeOutcome::Unchanged,
                });
                continue;
            };

            info!(node = %node.name, "updating taints");
            let outcome = match self.store.patch_taints(&node.name, &taints).await {
                Ok(()) => NodeOutcome::Patched,
                Err(e) => {
                    error!(node = %node.name, "failed to patch taints: {e:?}");
                    NodeOutcome::Failed {
                        reason: format!("{e:#}"),
                    }
                }
            };
            reports.push(NodeReport {
                node: node.name,
                outcome,
            });
        }

        Ok(ApplyReport {
            ups: ups.to_string(),
            desired: desired.clone(),
            nodes: reports,
        })
    }
}
