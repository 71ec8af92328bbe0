//! Test adapters implementing the domain traits

use core::error::Error;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use error_stack::Report;
use k8s_openapi::api::core::v1::Taint;

use super::traits::NodeTaintStore;
use super::traits::TelemetrySource;
use super::types::NodeTaints;
use super::types::TelemetrySnapshot;

#[derive(Debug, derive_more::Display)]
#[display("mock failure: {_0}")]
pub struct MockError(pub String);

const UNAVAILABLE: &str = "unavailable";

impl Error for MockError {}

#[derive(Default)]
struct StoreState {
    /// (ups, node) in insertion order
    nodes: Vec<(String, NodeTaints)>,
    failing_patches: HashSet<String>,
    fail_listing: bool,
    patches: Vec<(String, Vec<Taint>)>,
}

/// In-memory node store; clones share state.
#[derive(Clone, Default)]
pub struct MockNodeTaintStore {
    state: Arc<Mutex<StoreState>>,
}

impl MockNodeTaintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&self, ups: &str, node: NodeTaints) {
        let mut state = self.state.lock().unwrap();
        state.nodes.push((ups.to_string(), node));
    }

    /// Make every patch of `node` fail
    pub fn fail_patch_for(&self, node: &str) {
        let mut state = self.state.lock().unwrap();
        state.failing_patches.insert(node.to_string());
    }

    pub fn fail_listing(&self) {
        self.state.lock().unwrap().fail_listing = true;
    }

    /// Successful patches, in the order they were applied
    pub fn patches(&self) -> Vec<(String, Vec<Taint>)> {
        self.state.lock().unwrap().patches.clone()
    }

    pub fn taints_of(&self, node: &str) -> Option<Vec<Taint>> {
        let state = self.state.lock().unwrap();
        state
            .nodes
            .iter()
            .find(|(_, n)| n.name == node)
            .map(|(_, n)| n.taints.clone())
    }
}

#[async_trait::async_trait]
impl NodeTaintStore for MockNodeTaintStore {
    type Error = MockError;

    async fn list_nodes(&self, ups: &str) -> Result<Vec<NodeTaints>, Report<MockError>> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(Report::new(MockError("list nodes".to_string())));
        }
        Ok(state
            .nodes
            .iter()
            .filter(|(u, _)| u == ups)
            .map(|(_, n)| n.clone())
            .collect())
    }

    async fn patch_taints(&self, node: &str, taints: &[Taint]) -> Result<(), Report<MockError>> {
        let mut state = self.state.lock().unwrap();
        if state.failing_patches.contains(node) {
            return Err(Report::new(MockError("connection reset".to_string()))
                .change_context(MockError(format!("patch {node}"))));
        }
        if let Some((_, n)) = state.nodes.iter_mut().find(|(_, n)| n.name == node) {
            n.taints = taints.to_vec();
        }
        state.patches.push((node.to_string(), taints.to_vec()));
        Ok(())
    }
}

/// Telemetry source serving fixed snapshots.
#[derive(Default)]
pub struct MockTelemetrySource {
    devices: Vec<String>,
    snapshots: HashMap<String, TelemetrySnapshot>,
    unavailable: HashSet<String>,
    fail_listing: bool,
}

impl MockTelemetrySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ups(mut self, name: &str, snapshot: TelemetrySnapshot) -> Self {
        self.devices.push(name.to_string());
        self.snapshots.insert(name.to_string(), snapshot);
        self
    }

    /// List `name` but answer its snapshot with a device-level error
    pub fn with_unavailable_ups(mut self, name: &str) -> Self {
        self.devices.push(name.to_string());
        self.unavailable.insert(name.to_string());
        self
    }

    /// List `name` but fail its snapshot as if the source itself broke
    pub fn with_broken_ups(mut self, name: &str) -> Self {
        self.devices.push(name.to_string());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_listing = true;
        self
    }
}

#[async_trait::async_trait]
impl TelemetrySource for MockTelemetrySource {
    type Error = MockError;

    async fn list_ups(&mut self) -> Result<Vec<String>, Report<MockError>> {
        if self.fail_listing {
            return Err(Report::new(MockError("list ups".to_string())));
        }
        Ok(self.devices.clone())
    }

    async fn snapshot(&mut self, ups: &str) -> Result<TelemetrySnapshot, Report<MockError>> {
        if self.unavailable.contains(ups) {
            return Err(Report::new(MockError(format!("{UNAVAILABLE} {ups}"))));
        }
        self.snapshots
            .get(ups)
            .cloned()
            .ok_or_else(|| Report::new(MockError(format!("unknown ups {ups}"))))
    }

    fn is_device_unavailable(error: &Report<MockError>) -> bool {
        error.current_context().0.starts_with(UNAVAILABLE)
    }
}
