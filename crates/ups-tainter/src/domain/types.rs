//! Value types shared by the classifier, the reconciler and the applier.

use k8s_openapi::api::core::v1::Taint;

/// Default key of the taint owned by this system.
pub const DEFAULT_TAINT_KEY: &str = "ups.spikedhand.com/status";

/// Default node label associating a node with a UPS name.
pub const DEFAULT_NODE_LABEL: &str = "ups.spikedhand.com/name";

/// Default battery percentage below which nodes are evicted.
pub const DEFAULT_BATTERY_THRESHOLD: f32 = 20.0;

/// What a UPS reported at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    /// Space separated NUT status codes, e.g. `"OB DISCHRG"`.
    pub status: String,
    /// Battery charge in percent, `None` when the device does not report it.
    pub battery_percent: Option<f32>,
}

impl TelemetrySnapshot {
    pub fn new(status: impl Into<String>, battery_percent: Option<f32>) -> Self {
        Self {
            status: status.into(),
            battery_percent,
        }
    }

    /// Returns `true` if `code` is one of the whitespace separated status codes.
    pub fn has_status(&self, code: &str) -> bool {
        self.status.split_whitespace().any(|c| c == code)
    }

    /// Battery charge usable for threshold decisions.
    ///
    /// A zero reading is indistinguishable from an unpopulated one and is
    /// treated as unavailable.
    pub fn battery_reading(&self) -> Option<f32> {
        self.battery_percent
            .filter(|percent| percent.is_finite() && *percent > 0.0)
    }
}

/// Scheduling effect of the managed taint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TaintEffect {
    /// Block new workloads from being scheduled.
    #[display("NoSchedule")]
    NoSchedule,
    /// Evict workloads already running.
    #[display("NoExecute")]
    NoExecute,
}

/// Taint state a node should converge to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesiredTaintState {
    /// The managed taint must not exist.
    Absent,
    /// The managed taint must exist with this value and effect.
    Present {
        value: &'static str,
        effect: TaintEffect,
    },
}

impl DesiredTaintState {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    /// Builds the managed taint under `key`, or `None` when it must be absent.
    pub fn to_taint(&self, key: &str) -> Option<Taint> {
        match self {
            Self::Absent => None,
            Self::Present { value, effect } => Some(Taint {
                key: key.to_string(),
                value: Some((*value).to_string()),
                effect: effect.to_string(),
                time_added: None,
            }),
        }
    }
}

impl std::fmt::Display for DesiredTaintState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Present { value, effect } => write!(f, "{value}:{effect}"),
        }
    }
}

/// Process wide settings of the classifier and the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub struct TaintPolicy {
    /// Key of the taint this system owns exclusively.
    pub taint_key: String,
    /// Battery percentage below which nodes are evicted; `<= 0` disables the rule.
    pub battery_threshold: f32,
}

impl Default for TaintPolicy {
    fn default() -> Self {
        Self {
            taint_key: DEFAULT_TAINT_KEY.to_string(),
            battery_threshold: DEFAULT_BATTERY_THRESHOLD,
        }
    }
}

/// A node and the taints it currently carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTaints {
    pub name: String,
    pub taints: Vec<Taint>,
}
