//! Computes the taint collection a node should carry.

use std::collections::HashMap;

use k8s_openapi::api::core::v1::Taint;

use crate::domain::types::DesiredTaintState;

/// Reconcile `existing` against `desired` for the taint owned under `key`.
///
/// Returns `None` when `existing` already agrees with `desired`, otherwise the
/// full replacement collection. Taints under other keys are copied through
/// untouched and in order. The managed taint keeps its position when it is
/// replaced, is appended when missing, and every duplicate of it is collapsed.
pub fn reconcile(existing: &[Taint], desired: &DesiredTaintState, key: &str) -> Option<Vec<Taint>> {
    let managed = desired.to_taint(key);
    let mut result = Vec::with_capacity(existing.len() + 1);
    let mut found = false;

    for taint in existing {
        if taint.key != key {
            result.push(taint.clone());
            continue;
        }
        if !found {
            if let Some(managed) = &managed {
                result.push(managed.clone());
            }
        }
        found = true;
    }

    if !found {
        if let Some(managed) = managed {
            result.push(managed);
        }
    }

    // identical output also covers foreign duplicate keys, which key indexed
    // equality alone would report as a change on every call
    if result.as_slice() == existing || taints_equal(existing, &result) {
        None
    } else {
        Some(result)
    }
}

/// Order independent comparison of two taint collections.
///
/// Equal when both have the same length and every taint of `b` matches the
/// value and effect of the taint with the same key in `a`. When `a` holds
/// duplicate keys the last one counts. `time_added` is ignored, it is owned by
/// the API server.
pub fn taints_equal(a: &[Taint], b: &[Taint]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let index: HashMap<&str, &Taint> = a.iter().map(|t| (t.key.as_str(), t)).collect();

    b.iter().all(|taint| {
        index
            .get(taint.key.as_str())
            .is_some_and(|existing| existing.value == taint.value && existing.effect == taint.effect)
    })
}
