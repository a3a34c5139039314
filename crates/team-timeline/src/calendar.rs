//! The merged calendar cached for a team.
//!
//! A [`MergedCalendar`] is a disposable projection of a team's events. It is
//! rebuilt from scratch whenever the events change (or on a periodic
//! refresh) and can be discarded at any time: the events remain the source of
//! truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::{Event, TeamId};
use crate::interval::Interval;
use crate::merge::{self, TimelineSegment};
use crate::team::{self, Team};

/// The most recently computed timeline for a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedCalendar {
    pub team_id: TeamId,
    /// Sorted, contiguous, non-overlapping segments.
    pub segments: Vec<TimelineSegment>,
    pub computed_at: DateTime<Utc>,
}

impl MergedCalendar {
    /// Merge `events` into a calendar for `team_id`.
    ///
    /// # Errors
    /// Propagates `CalendarError::InvalidInterval` from [`merge::merge`]; no
    /// calendar is produced in that case.
    pub fn compute(team_id: TeamId, events: &[Event], computed_at: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            team_id,
            segments: merge::merge(events)?,
            computed_at,
        })
    }

    /// Merge every event any member of `team` owns or takes part in.
    ///
    /// # Errors
    /// Same as [`MergedCalendar::compute`].
    pub fn for_team_members(team: &Team, events: &[Event], computed_at: DateTime<Utc>) -> Result<Self> {
        let member_events = team::events_for_team(team, events);
        Self::compute(team.id.clone(), &member_events, computed_at)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn occupied(&self) -> impl Iterator<Item = &TimelineSegment> {
        self.segments.iter().filter(|segment| segment.is_occupied())
    }

    pub fn free(&self) -> impl Iterator<Item = &TimelineSegment> {
        self.segments.iter().filter(|segment| segment.is_free())
    }

    /// The first free segment lasting at least `min_duration_minutes`.
    ///
    /// Only gaps between events are considered; time before the first or after
    /// the last event is outside the timeline.
    pub fn first_free_slot(&self, min_duration_minutes: i64) -> Option<&TimelineSegment> {
        self.free()
            .find(|segment| segment.duration_minutes() >= min_duration_minutes)
    }

    /// Whether any event covers `instant`.
    pub fn is_busy_at(&self, instant: DateTime<Utc>) -> bool {
        self.occupied()
            .any(|segment| segment.start <= instant && instant < segment.end)
    }

    /// From the earliest event start to the latest event end.
    pub fn span(&self) -> Option<Interval> {
        let first = self.segments.first()?;
        let last = self.segments.last()?;
        Interval::new(first.start, last.end).ok()
    }
}
