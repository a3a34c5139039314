//! Merge team events into one ordered timeline of occupied and free spans.
//!
//! Sorts intervals by start time, collapses overlapping or touching intervals
//! into single occupied spans, and fills the gaps between them with free
//! spans. The timeline covers exactly the observed range: it starts at the
//! earliest event start and ends at the latest event end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::Event;
use crate::interval::Interval;

/// Whether a timeline span is covered by any event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Free,
    Occupied,
}

/// One span of a merged timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSegment {
    pub kind: SegmentKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimelineSegment {
    pub fn occupied(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            kind: SegmentKind::Occupied,
            start,
            end,
        }
    }

    pub fn free(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            kind: SegmentKind::Free,
            start,
            end,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.kind == SegmentKind::Occupied
    }

    pub fn is_free(&self) -> bool {
        self.kind == SegmentKind::Free
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// The span of this segment as an [`Interval`].
    ///
    /// # Errors
    /// Segments produced by [`merge`] always convert; a hand-built segment
    /// with `start >= end` yields `CalendarError::InvalidInterval`.
    pub fn interval(&self) -> Result<Interval> {
        Interval::new(self.start, self.end)
    }
}

/// Merge the events of a team into a timeline.
///
/// Event identity is discarded: overlapping events collapse into a single
/// occupied segment. Two events that merely touch (`a.end == b.start`) are
/// merged as well, so no zero-length free segment is ever produced.
///
/// An empty slice yields an empty timeline. The input is not reordered.
///
/// # Errors
/// Returns `CalendarError::InvalidInterval` naming the first event with
/// `start >= end`. Nothing is merged in that case.
pub fn merge(events: &[Event]) -> Result<Vec<TimelineSegment>> {
    let intervals = events
        .iter()
        .map(Event::interval)
        .collect::<Result<Vec<_>>>()?;

    Ok(merge_intervals(&intervals))
}

/// Merge already validated intervals into a timeline.
///
/// Intervals are sorted by start, ties broken by the shorter interval first.
/// Occupied segments are emitted lazily: a segment is only closed once a
/// later interval starts strictly after its running end, or the input runs
/// out.
pub fn merge_intervals(intervals: &[Interval]) -> Vec<TimelineSegment> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|interval| (interval.start(), interval.end()));

    let mut timeline = Vec::new();
    let mut pending: Option<Interval> = None;

    for interval in sorted {
        pending = match pending {
            Some(open) if open.touches_or_overlaps(&interval) => Some(open.hull(&interval)),
            Some(open) => {
                timeline.push(TimelineSegment::occupied(open.start(), open.end()));
                timeline.push(TimelineSegment::free(open.end(), interval.start()));
                Some(interval)
            }
            None => Some(interval),
        };
    }

    if let Some(open) = pending {
        timeline.push(TimelineSegment::occupied(open.start(), open.end()));
    }

    timeline
}

/// The occupied spans of a timeline, in order.
///
/// # Errors
/// `CalendarError::InvalidInterval` if a hand-built segment has
/// `start >= end`.
pub fn occupied_spans(timeline: &[TimelineSegment]) -> Result<Vec<Interval>> {
    spans_of(timeline, SegmentKind::Occupied)
}

/// The free spans of a timeline, in order.
///
/// # Errors
/// Same as [`occupied_spans`].
pub fn free_spans(timeline: &[TimelineSegment]) -> Result<Vec<Interval>> {
    spans_of(timeline, SegmentKind::Free)
}

fn spans_of(timeline: &[TimelineSegment], kind: SegmentKind) -> Result<Vec<Interval>> {
    timeline
        .iter()
        .filter(|segment| segment.kind == kind)
        .map(TimelineSegment::interval)
        .collect()
}
