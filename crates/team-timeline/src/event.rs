//! Event records and the identifiers that tie them to users and teams.
//!
//! Events arrive from an external repository as read-only snapshots. Their
//! raw `start`/`end` are kept as supplied; [`Event::interval`] is the single
//! place where they are checked.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};
use crate::interval::Interval;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a stored event.
    EventId
);
string_id!(
    /// Identifier of a registered user.
    UserId
);
string_id!(
    /// Identifier of a team.
    TeamId
);

/// A calendar event as supplied by the event repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    /// The creator. Only the owner may update or delete the event.
    pub owner_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub participant_ids: BTreeSet<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Event {
    /// Create an event owned by `owner_id`. The owner is always a participant.
    pub fn new(
        id: impl Into<EventId>,
        title: impl Into<String>,
        owner_id: impl Into<UserId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        let owner_id = owner_id.into();
        let mut participant_ids = BTreeSet::new();
        participant_ids.insert(owner_id.clone());
        Self {
            id: id.into(),
            title: title.into(),
            owner_id,
            start,
            end,
            participant_ids,
            location: None,
            description: None,
        }
    }

    pub fn with_participant(mut self, user: impl Into<UserId>) -> Self {
        self.participant_ids.insert(user.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The validated interval of this event.
    ///
    /// # Errors
    /// Returns `CalendarError::InvalidInterval` carrying this event's id when
    /// `start >= end`.
    pub fn interval(&self) -> Result<Interval> {
        Interval::new(self.start, self.end).map_err(|_| CalendarError::InvalidInterval {
            event_id: Some(self.id.clone()),
            start: self.start,
            end: self.end,
        })
    }

    /// Whether `user` owns or participates in this event.
    pub fn involves(&self, user: &UserId) -> bool {
        self.owner_id == *user || self.participant_ids.contains(user)
    }
}
