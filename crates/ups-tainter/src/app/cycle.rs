//! One evaluation cycle: read every UPS, classify it, taint its nodes.

use core::error::Error;

use error_stack::Report;
use error_stack::ResultExt;
use tracing::info;
use tracing::warn;

use crate::config::NutSettings;
use crate::config::RunArgs;
use crate::domain::classify;
use crate::domain::traits::NodeTaintStore;
use crate::domain::traits::TelemetrySource;
use crate::domain::ApplyReport;
use crate::domain::NodeTaintApplier;
use crate::domain::TaintPolicy;
use crate::domain::TelemetrySnapshot;
use crate::infrastructure::k8s::KubeNodeStore;
use crate::infrastructure::kube_client;
use crate::infrastructure::nut::NutClient;

/// Reasons a whole cycle is abandoned.
#[derive(Debug, derive_more::Display)]
pub enum CycleError {
    #[display("Failed to read UPS telemetry")]
    Telemetry,
    #[display("Failed to reach Kubernetes")]
    Kubernetes,
}

impl Error for CycleError {}

/// Everything a cycle did, one entry per handled UPS.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub ups: Vec<ApplyReport>,
}

impl CycleReport {
    pub fn patched(&self) -> usize {
        self.ups.iter().map(ApplyReport::patched).sum()
    }

    pub fn failed(&self) -> usize {
        self.ups.iter().map(ApplyReport::failed).sum()
    }
}

/// Classify every UPS accepted by `handles` and apply the result to its nodes.
///
/// # Errors
///
/// - [`CycleError::Telemetry`] if devices cannot be listed, or a device read
///   fails in a way that leaves the telemetry source unusable. A device the
///   source reports as unavailable is classified with empty telemetry instead.
/// - [`CycleError::Kubernetes`] if the nodes of a UPS cannot be listed
pub async fn evaluate<T, S>(
    telemetry: &mut T,
    applier: &NodeTaintApplier<S>,
    policy: &TaintPolicy,
    handles: impl Fn(&str) -> bool,
) -> Result<CycleReport, Report<CycleError>>
where
    T: TelemetrySource,
    S: NodeTaintStore,
{
    let devices = telemetry
        .list_ups()
        .await
        .change_context(CycleError::Telemetry)?;

    let mut report = CycleReport::default();
    for ups in devices.iter().filter(|ups| handles(ups)) {
        let snapshot = match telemetry.snapshot(ups).await {
            Ok(snapshot) => snapshot,
            Err(e) if T::is_device_unavailable(&e) => {
                warn!(ups = %ups, "UPS telemetry unavailable, treating as unknown: {e:?}");
                TelemetrySnapshot::default()
            }
            Err(e) => {
                return Err(e
                    .change_context(CycleError::Telemetry)
                    .attach_printable(format!("ups: {ups}")));
            }
        };

        let desired = classify(&snapshot, policy.battery_threshold);
        info!(
            ups = %ups,
            status = %snapshot.status,
            battery = ?snapshot.battery_percent,
            desired = %desired,
            "classified UPS"
        );

        let applied = applier
            .apply(ups, &desired)
            .await
            .change_context(CycleError::Kubernetes)
            .attach_printable_lazy(|| format!("ups: {ups}"))?;
        report.ups.push(applied);
    }

    Ok(report)
}

/// Long lived dependencies of the cycle.
pub struct Evaluator {
    nut: NutSettings,
    policy: TaintPolicy,
    applier: NodeTaintApplier<KubeNodeStore>,
}

impl Evaluator {
    /// Build the Kubernetes client and the settings from the command line.
    pub async fn init(args: &RunArgs) -> Result<Self, Report<CycleError>> {
        let client = kube_client::init_kube_client(args.kubeconfig.as_deref(), args.request_timeout())
            .await
            .change_context(CycleError::Kubernetes)?;
        let policy = TaintPolicy::from(args);
        let applier = NodeTaintApplier::new(
            KubeNodeStore::new(client, args.node_label.clone()),
            policy.taint_key.clone(),
        );

        Ok(Self {
            nut: NutSettings::from(args),
            policy,
            applier,
        })
    }

    /// Connect to NUT, evaluate every handled UPS and log out.
    #[tracing::instrument(skip(self), fields(nut = %self.nut.address))]
    pub async fn run_cycle(&self) -> Result<CycleReport, Report<CycleError>> {
        let mut client = NutClient::connect(&self.nut.address, self.nut.timeout)
            .await
            .change_context(CycleError::Telemetry)?;

        if !self.nut.username.is_empty() {
            client
                .authenticate(&self.nut.username, &self.nut.password)
                .await
                .change_context(CycleError::Telemetry)?;
        }

        let report = evaluate(&mut client, &self.applier, &self.policy, |ups| {
            self.nut.handles(ups)
        })
        .await;

        if let Err(e) = client.logout().await {
            warn!("NUT logout failed: {e:?}");
        }

        let report = report?;
        info!(
            ups = report.ups.len(),
            patched = report.patched(),
            failed = report.failed(),
            "cycle completed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::Taint;
    use similar_asserts::assert_eq;
    use test_log::test;

    use super::*;
    use crate::domain::mock::MockNodeTaintStore;
    use crate::domain::mock::MockTelemetrySource;
    use crate::domain::DesiredTaintState;
    use crate::domain::NodeOutcome;
    use crate::domain::NodeTaints;
    use crate::domain::TaintEffect;

    const KEY: &str = "ups.spikedhand.com/status";

    fn taint(key: &str, value: &str, effect: &str) -> Taint {
        Taint {
            key: key.to_string(),
            value: Some(value.to_string()),
            effect: effect.to_string(),
            time_added: None,
        }
    }

    fn node(name: &str, taints: Vec<Taint>) -> NodeTaints {
        NodeTaints {
            name: name.to_string(),
            taints,
        }
    }

    #[test(tokio::test)]
    async fn each_ups_taints_its_own_nodes() {
        let mut telemetry = MockTelemetrySource::new()
            .with_ups("rack-a", TelemetrySnapshot::new("OL CHRG", Some(100.0)))
            .with_ups("rack-b", TelemetrySnapshot::new("OB DISCHRG", Some(12.0)));
        let store = MockNodeTaintStore::new();
        store.add_node(
            "rack-a",
            node("worker-1", vec![taint(KEY, "on-battery", "NoSchedule")]),
        );
        store.add_node("rack-b", node("worker-2", vec![]));

        let applier = NodeTaintApplier::new(store.clone(), KEY);
        let report = evaluate(&mut telemetry, &applier, &TaintPolicy::default(), |_| true)
            .await
            .expect("cycle should succeed");

        assert_eq!(report.ups.len(), 2);
        assert_eq!(report.ups[0].desired, DesiredTaintState::Absent);
        assert_eq!(
            report.ups[1].desired,
            DesiredTaintState::Present {
                value: "below-threshold",
                effect: TaintEffect::NoExecute,
            }
        );
        assert_eq!(report.patched(), 2);
        assert_eq!(store.taints_of("worker-1"), Some(vec![]));
        assert_eq!(
            store.taints_of("worker-2"),
            Some(vec![taint(KEY, "below-threshold", "NoExecute")])
        );
    }

    #[test(tokio::test)]
    async fn filter_skips_other_devices() {
        let mut telemetry = MockTelemetrySource::new()
            .with_ups("rack-a", TelemetrySnapshot::new("OB", Some(90.0)))
            .with_ups("rack-b", TelemetrySnapshot::new("OB", Some(90.0)));
        let store = MockNodeTaintStore::new();
        store.add_node("rack-a", node("worker-1", vec![]));
        store.add_node("rack-b", node("worker-2", vec![]));

        let applier = NodeTaintApplier::new(store.clone(), KEY);
        let report = evaluate(&mut telemetry, &applier, &TaintPolicy::default(), |ups| {
            ups == "rack-b"
        })
        .await
        .expect("cycle should succeed");

        assert_eq!(report.ups.len(), 1);
        assert_eq!(report.ups[0].ups, "rack-b");
        assert_eq!(store.taints_of("worker-1"), Some(vec![]));
    }

    #[test(tokio::test)]
    async fn missing_telemetry_fails_closed() {
        let mut telemetry = MockTelemetrySource::new().with_ups("rack-a", TelemetrySnapshot::default());
        let store = MockNodeTaintStore::new();
        store.add_node("rack-a", node("worker-1", vec![]));

        let applier = NodeTaintApplier::new(store.clone(), KEY);
        evaluate(&mut telemetry, &applier, &TaintPolicy::default(), |_| true)
            .await
            .expect("cycle should succeed");

        assert_eq!(
            store.taints_of("worker-1"),
            Some(vec![taint(KEY, "unknown", "NoSchedule")])
        );
    }

    #[test(tokio::test)]
    async fn telemetry_failure_aborts_cycle() {
        let mut telemetry = MockTelemetrySource::new().failing();
        let applier = NodeTaintApplier::new(MockNodeTaintStore::new(), KEY);
        let err = evaluate(&mut telemetry, &applier, &TaintPolicy::default(), |_| true)
            .await
            .expect_err("cycle should abort");
        assert!(matches!(err.current_context(), CycleError::Telemetry));
    }

    #[test(tokio::test)]
    async fn unavailable_device_fails_closed_and_cycle_continues() {
        let mut telemetry = MockTelemetrySource::new()
            .with_unavailable_ups("stale")
            .with_ups("rack-b", TelemetrySnapshot::new("OB LB", Some(3.0)));
        let store = MockNodeTaintStore::new();
        store.add_node("stale", node("worker-stale", vec![]));
        store.add_node("rack-b", node("worker-b", vec![]));

        let applier = NodeTaintApplier::new(store.clone(), KEY);
        let report = evaluate(&mut telemetry, &applier, &TaintPolicy::default(), |_| true)
            .await
            .expect("cycle should succeed");

        assert_eq!(report.ups.len(), 2);
        assert_eq!(report.patched(), 2);
        assert_eq!(
            store.taints_of("worker-stale"),
            Some(vec![taint(KEY, "unknown", "NoSchedule")])
        );
        assert_eq!(
            store.taints_of("worker-b"),
            Some(vec![taint(KEY, "low-battery", "NoExecute")])
        );
    }

    #[test(tokio::test)]
    async fn broken_read_aborts_cycle() {
        let mut telemetry = MockTelemetrySource::new()
            .with_broken_ups("rack-a")
            .with_ups("rack-b", TelemetrySnapshot::new("OB LB", Some(3.0)));
        let store = MockNodeTaintStore::new();
        store.add_node("rack-b", node("worker-b", vec![]));

        let applier = NodeTaintApplier::new(store.clone(), KEY);
        let err = evaluate(&mut telemetry, &applier, &TaintPolicy::default(), |_| true)
            .await
            .expect_err("cycle should abort");
        assert!(matches!(err.current_context(), CycleError::Telemetry));
        assert!(store.patches().is_empty());
    }

    #[test(tokio::test)]
    async fn node_listing_failure_aborts_cycle() {
        let mut telemetry =
            MockTelemetrySource::new().with_ups("rack-a", TelemetrySnapshot::new("OB", None));
        let store = MockNodeTaintStore::new();
        store.fail_listing();
        let applier = NodeTaintApplier::new(store, KEY);
        let err = evaluate(&mut telemetry, &applier, &TaintPolicy::default(), |_| true)
            .await
            .expect_err("cycle should abort");
        assert!(matches!(err.current_context(), CycleError::Kubernetes));
    }

    #[test(tokio::test)]
    async fn patch_failures_do_not_abort_cycle() {
        let mut telemetry = MockTelemetrySource::new()
            .with_ups("rack-a", TelemetrySnapshot::new("OB LB", Some(4.0)))
            .with_ups("rack-b", TelemetrySnapshot::new("OB LB", Some(4.0)));
        let store = MockNodeTaintStore::new();
        store.add_node("rack-a", node("worker-1", vec![]));
        store.add_node("rack-b", node("worker-2", vec![]));
        store.fail_patch_for("worker-1");

        let applier = NodeTaintApplier::new(store.clone(), KEY);
        let report = evaluate(&mut telemetry, &applier, &TaintPolicy::default(), |_| true)
            .await
            .expect("cycle should succeed");

        assert_eq!(report.failed(), 1);
        assert_eq!(report.patched(), 1);
        assert!(matches!(
            report.ups[0].nodes[0].outcome,
            NodeOutcome::Failed { .. }
        ));
        assert_eq!(
            store.taints_of("worker-2"),
            Some(vec![taint(KEY, "low-battery", "NoExecute")])
        );
    }
}
