//! Detect whether a candidate interval overlaps existing events.
//!
//! Runs a linear scan over the existing intervals. Adjacent intervals (where
//! one ends exactly when another starts) are NOT conflicts, so back-to-back
//! meetings can be scheduled even though the merged timeline shows them as a
//! single occupied block.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::{Event, EventId};
use crate::interval::Interval;

/// An existing event that a candidate overlaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub event_id: EventId,
    pub interval: Interval,
    pub overlap_minutes: i64,
}

/// Validate a raw candidate before running a conflict check.
///
/// # Errors
/// Returns `CalendarError::InvalidInterval` when `start >= end`, the same
/// condition the merge engine raises.
pub fn check_candidate(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Interval> {
    Interval::new(start, end)
}

/// Whether `candidate` overlaps any interval in `existing`.
pub fn has_conflict(candidate: &Interval, existing: &[Interval]) -> bool {
    existing.iter().any(|other| candidate.overlaps(other))
}

/// Every interval in `existing` that `candidate` overlaps, in input order.
pub fn find_conflicts(candidate: &Interval, existing: &[Interval]) -> Vec<Interval> {
    existing
        .iter()
        .filter(|other| candidate.overlaps(other))
        .copied()
        .collect()
}

/// Every event in `existing` that `candidate` overlaps, with the overlap
/// length for diagnostics.
///
/// # Errors
/// Returns `CalendarError::InvalidInterval` carrying the event id if any
/// existing event has `start >= end`.
pub fn find_event_conflicts(candidate: &Interval, existing: &[Event]) -> Result<Vec<Conflict>> {
    let mut conflicts = Vec::new();

    for event in existing {
        let interval = event.interval()?;
        if let Some(overlap_minutes) = candidate.overlap_minutes(&interval) {
            conflicts.push(Conflict {
                event_id: event.id.clone(),
                interval,
                overlap_minutes,
            });
        }
    }

    Ok(conflicts)
}
