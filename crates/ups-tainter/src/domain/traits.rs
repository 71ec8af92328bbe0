//! Capabilities the domain consumes from the outside world

use error_stack::Context;
use error_stack::Report;
use k8s_openapi::api::core::v1::Taint;

use crate::domain::types::NodeTaints;
use crate::domain::types::TelemetrySnapshot;

/// Source of UPS telemetry for one evaluation cycle.
#[async_trait::async_trait]
pub trait TelemetrySource: Send {
    type Error: Context;

    /// Names of all UPS devices known to the source.
    async fn list_ups(&mut self) -> Result<Vec<String>, Report<Self::Error>>;

    /// Current status and battery charge of `ups`.
    ///
    /// Missing variables are reported as empty status or `None` charge, not
    /// as errors.
    async fn snapshot(&mut self, ups: &str) -> Result<TelemetrySnapshot, Report<Self::Error>>;

    /// Whether a [`snapshot`](Self::snapshot) error only means that this one
    /// device has no usable data, leaving the source usable for other devices.
    fn is_device_unavailable(_error: &Report<Self::Error>) -> bool {
        false
    }
}

/// Reads and replaces node taints.
#[async_trait::async_trait]
pub trait NodeTaintStore: Send + Sync {
    type Error: Context;

    /// Nodes associated with `ups`, with their current taints.
    async fn list_nodes(&self, ups: &str) -> Result<Vec<NodeTaints>, Report<Self::Error>>;

    /// Replace the full taint collection of `node`.
    async fn patch_taints(&self, node: &str, taints: &[Taint]) -> Result<(), Report<Self::Error>>;
}
