use core::error::Error;

/// Errors that can occur during Kubernetes operations.
#[derive(Debug, derive_more::Display)]
pub enum KubernetesError {
    #[display("Failed to connect to Kubernetes API: {message}")]
    ConnectionFailed { message: String },
    #[display("Failed to list nodes with selector {selector}")]
    ListNodesFailed { selector: String },
    #[display("Failed to patch taints of node {node}")]
    PatchFailed { node: String },
}

impl Error for KubernetesError {}
