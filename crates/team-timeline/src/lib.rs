//! # team-timeline
//!
//! Team calendar merging and conflict detection.
//!
//! Given the events of every member of a team, the merge engine computes one
//! ordered timeline of occupied and free spans. The conflict detector decides
//! whether a candidate event overlaps events already on the calendar. Both are
//! pure functions over in-memory snapshots; storage, admission and periodic
//! refresh live in the collaborator modules around them.
//!
//! ## Modules
//!
//! - [`interval`] — Half-open UTC intervals
//! - [`event`] — Event records and identifiers
//! - [`merge`] — Events → ordered occupied/free timeline
//! - [`conflict`] — Overlap checks for event admission
//! - [`calendar`] — The cached merged calendar of a team
//! - [`team`] — Membership and role ranks
//! - [`repository`] — Event storage with atomic admission
//! - [`scheduler`] — Periodic calendar refresh
//! - [`poll`] — Voting on candidate time slots
//! - [`error`] — Error types

pub mod calendar;
pub mod conflict;
pub mod error;
pub mod event;
pub mod interval;
pub mod merge;
pub mod poll;
pub mod repository;
pub mod scheduler;
pub mod team;

pub use calendar::MergedCalendar;
pub use conflict::{find_conflicts, has_conflict, Conflict};
pub use error::{CalendarError, Result};
pub use event::{Event, EventId, TeamId, UserId};
pub use interval::Interval;
pub use merge::{merge, merge_intervals, SegmentKind, TimelineSegment};
pub use repository::{EventRepository, InMemoryRepository};
pub use team::{Role, Team};
