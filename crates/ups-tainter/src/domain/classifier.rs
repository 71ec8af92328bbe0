//! Maps a UPS telemetry snapshot to the taint its nodes should carry.

use crate::domain::types::DesiredTaintState;
use crate::domain::types::TaintEffect;
use crate::domain::types::TelemetrySnapshot;

/// Mains power present.
const STATUS_ONLINE: &str = "OL";
/// Running on battery.
const STATUS_ON_BATTERY: &str = "OB";
/// Battery is low.
const STATUS_LOW_BATTERY: &str = "LB";

/// Classify a snapshot into the desired taint state.
///
/// Rules are checked in priority order and the first match wins:
///
/// 1. `OL` anywhere in the status: no taint, whatever else is reported.
/// 2. `OB` together with `LB`: `low-battery`, evicting.
/// 3. A positive `threshold` with the battery charge below it: `below-threshold`, evicting.
/// 4. `OB`: `on-battery`, blocking new workloads.
/// 5. Anything else, including an empty status: `unknown`, blocking new workloads.
///
/// An unavailable battery charge never triggers rule 3.
pub fn classify(snapshot: &TelemetrySnapshot, threshold: f32) -> DesiredTaintState {
    if snapshot.has_status(STATUS_ONLINE) {
        return DesiredTaintState::Absent;
    }

    let on_battery = snapshot.has_status(STATUS_ON_BATTERY);

    if on_battery && snapshot.has_status(STATUS_LOW_BATTERY) {
        return DesiredTaintState::Present {
            value: "low-battery",
            effect: TaintEffect::NoExecute,
        };
    }

    if threshold > 0.0
        && snapshot
            .battery_reading()
            .is_some_and(|percent| percent < threshold)
    {
        return DesiredTaintState::Present {
            value: "below-threshold",
            effect: TaintEffect::NoExecute,
        };
    }

    if on_battery {
        return DesiredTaintState::Present {
            value: "on-battery",
            effect: TaintEffect::NoSchedule,
        };
    }

    // an unrecognised state is not a healthy one
    DesiredTaintState::Present {
        value: "unknown",
        effect: TaintEffect::NoSchedule,
    }
}
