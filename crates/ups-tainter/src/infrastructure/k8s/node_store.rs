use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::api::core::v1::Taint;
use kube::api::ListParams;
use kube::api::Patch;
use kube::api::PatchParams;
use kube::Api;
use kube::Client;
use serde_json::json;
use tracing::debug;

use crate::domain::traits::NodeTaintStore;
use crate::domain::types::NodeTaints;
use crate::infrastructure::k8s::KubernetesError;

/// Node taint access through the Kubernetes API.
///
/// Nodes belong to a UPS when their `node_label` equals the UPS name.
pub struct KubeNodeStore {
    api: Api<Node>,
    node_label: String,
}

impl KubeNodeStore {
    pub fn new(client: Client, node_label: impl Into<String>) -> Self {
        Self {
            api: Api::all(client),
            node_label: node_label.into(),
        }
    }

    fn selector(&self, ups: &str) -> String {
        label_selector(&self.node_label, ups)
    }
}

fn label_selector(label: &str, ups: &str) -> String {
    format!("{label}={ups}")
}

fn node_taints(node: Node) -> NodeTaints {
    NodeTaints {
        name: node.metadata.name.unwrap_or_default(),
        taints: node.spec.and_then(|spec| spec.taints).unwrap_or_default(),
    }
}

/// Strategic merge patch replacing the whole taint list; taints carry no
/// merge key so the list is replaced rather than merged.
fn taints_patch(taints: &[Taint]) -> serde_json::Value {
    json!({
        "spec": {
            "taints": taints,
        }
    })
}

#[async_trait::async_trait]
impl NodeTaintStore for KubeNodeStore {
    type Error = KubernetesError;

    async fn list_nodes(&self, ups: &str) -> Result<Vec<NodeTaints>, Report<KubernetesError>> {
        let selector = self.selector(ups);
        let nodes = self
            .api
            .list(&ListParams::default().labels(&selector))
            .await
            .change_context(KubernetesError::ListNodesFailed {
                selector: selector.clone(),
            })?;

        debug!(selector = %selector, count = nodes.items.len(), "listed nodes");
        Ok(nodes.items.into_iter().map(node_taints).collect())
    }

    async fn patch_taints(&self, node: &str, taints: &[Taint]) -> Result<(), Report<KubernetesError>> {
        self.api
            .patch(node, &PatchParams::default(), &Patch::Strategic(taints_patch(taints)))
            .await
            .change_context(KubernetesError::PatchFailed {
                node: node.to_string(),
            })?;
        Ok(())
    }
}
