//! Batch verdict aggregation
//!
//! Pure, deterministic fold over a status map. Used by the orchestrator at
//! run completion and by status pollers computing a provisional verdict over
//! a partially-complete map — non-terminal entries count as "not yet
//! succeeded", so a provisional verdict can never be `AllSucceeded` while
//! anything is still pending or in flight.

use std::collections::HashMap;

use crate::types::{TargetStatus, Verdict};

/// Compute the three-way batch verdict from a per-target status map
///
/// - every target `Succeeded` => [`Verdict::AllSucceeded`]
/// - no target `Succeeded` => [`Verdict::AllFailed`]
/// - otherwise => [`Verdict::Partial`]
///
/// An empty map aggregates to `AllFailed` (nothing succeeded).
pub fn aggregate(status_by_target: &HashMap<String, TargetStatus>) -> Verdict {
    let succeeded = status_by_target
        .values()
        .filter(|s| **s == TargetStatus::Succeeded)
        .count();

    if succeeded == status_by_target.len() && !status_by_target.is_empty() {
        Verdict::AllSucceeded
    } else if succeeded == 0 {
        Verdict::AllFailed
    } else {
        Verdict::Partial
    }
}
