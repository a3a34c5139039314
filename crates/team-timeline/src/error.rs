//! Error types for team-timeline operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::event::{EventId, TeamId, UserId};
use crate::team::Role;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalendarError {
    /// An interval with `start >= end`. `event_id` is `None` for a bare
    /// candidate interval that does not belong to a stored event yet.
    #[error("Invalid interval{}: start {start} is not before end {end}", fmt_event(.event_id))]
    InvalidInterval {
        event_id: Option<EventId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Event {event} conflicts with existing events: {}", fmt_ids(.conflicts))]
    Conflict {
        event: EventId,
        conflicts: Vec<EventId>,
    },

    #[error("Unknown team: {0}")]
    UnknownTeam(TeamId),

    #[error("Unknown event: {0}")]
    UnknownEvent(EventId),

    #[error("Event {0} already exists")]
    DuplicateEvent(EventId),

    #[error("User {user} is not the owner of event {event}")]
    NotOwner { event: EventId, user: UserId },

    #[error("Team {0} already exists")]
    DuplicateTeam(TeamId),

    #[error("User {user} needs the {required:?} role or higher")]
    NotPermitted { user: UserId, required: Role },

    #[error("User {0} is not a member of the team")]
    NotMember(UserId),

    #[error("User {0} is already a member of the team")]
    AlreadyMember(UserId),

    #[error("User {0} is the last admin of the team")]
    LastAdmin(UserId),

    #[error("Unknown poll option: {0}")]
    UnknownOption(usize),

    #[error("User {user} already voted for option {option}")]
    AlreadyVoted { user: UserId, option: usize },
}

fn fmt_event(event_id: &Option<EventId>) -> String {
    match event_id {
        Some(id) => format!(" in event {id}"),
        None => String::new(),
    }
}

fn fmt_ids(ids: &[EventId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, CalendarError>;
