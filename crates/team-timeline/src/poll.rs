//! Voting on candidate time slots for an event.
//!
//! A poll collects a few proposed intervals, lets team members vote for any
//! number of them (once per option), and picks the most popular option that
//! still fits the team calendar.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::conflict;
use crate::error::{CalendarError, Result};
use crate::event::{EventId, UserId};
use crate::interval::Interval;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOption {
    pub interval: Interval,
    #[serde(default)]
    pub voters: BTreeSet<UserId>,
}

impl SlotOption {
    pub fn votes(&self) -> usize {
        self.voters.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotPoll {
    pub event_id: EventId,
    pub options: Vec<SlotOption>,
}

impl TimeSlotPoll {
    pub fn new(event_id: impl Into<EventId>) -> Self {
        Self {
            event_id: event_id.into(),
            options: Vec::new(),
        }
    }

    /// Propose `interval` and return its option index.
    pub fn add_option(&mut self, interval: Interval) -> usize {
        self.options.push(SlotOption {
            interval,
            voters: BTreeSet::new(),
        });
        self.options.len() - 1
    }

    /// Record a vote by `user` for option `index`.
    ///
    /// # Errors
    /// `UnknownOption` for an out-of-range index, `AlreadyVoted` when the user
    /// already voted for this option.
    pub fn vote(&mut self, user: impl Into<UserId>, index: usize) -> Result<()> {
        let user = user.into();
        let option = self
            .options
            .get_mut(index)
            .ok_or(CalendarError::UnknownOption(index))?;
        if !option.voters.insert(user.clone()) {
            return Err(CalendarError::AlreadyVoted {
                user,
                option: index,
            });
        }
        Ok(())
    }

    /// Option indices ordered by vote count (highest first), then by start.
    pub fn tally(&self) -> Vec<(usize, usize)> {
        let mut ranked: Vec<(usize, usize)> = self
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| (index, option.votes()))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1).then_with(|| {
                self.options[a.0]
                    .interval
                    .cmp(&self.options[b.0].interval)
            })
        });
        ranked
    }

    /// The highest-ranked option that conflicts with none of `existing`.
    pub fn best_available(&self, existing: &[Interval]) -> Option<&SlotOption> {
        self.tally()
            .into_iter()
            .map(|(index, _)| &self.options[index])
            .find(|option| !conflict::has_conflict(&option.interval, existing))
    }
}
