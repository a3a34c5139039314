//! The event repository collaborator and its in-memory implementation.
//!
//! The merge engine and conflict detector are pure; the only place where
//! concurrency matters is admission. Reading a team's events, checking the
//! candidate for conflicts and writing it must happen as one step, otherwise
//! two overlapping events can both pass the check. [`InMemoryRepository`]
//! holds one mutex per team for exactly that sequence, so writers to
//! different teams never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::calendar::MergedCalendar;
use crate::conflict;
use crate::error::{CalendarError, Result};
use crate::event::{Event, EventId, TeamId, UserId};
use crate::team::{Role, Team};

/// Storage for team events and their cached merged calendars.
pub trait EventRepository: Send + Sync {
    /// Every known team.
    fn teams(&self) -> Vec<TeamId>;

    /// A snapshot of the events stored for `team`.
    fn team_events(&self, team: &TeamId) -> Result<Vec<Event>>;

    /// Replace the cached merged calendar of `calendar.team_id`.
    fn store_merged(&self, calendar: MergedCalendar) -> Result<()>;

    /// The cached merged calendar of `team`, if one was computed.
    fn merged(&self, team: &TeamId) -> Result<Option<MergedCalendar>>;

    /// Rebuild and cache the merged calendar of `team` from its current
    /// events.
    ///
    /// The default reads, merges and stores in three steps. Implementations
    /// with a per-team lock should override it so a concurrent write cannot
    /// be overwritten by an older snapshot.
    fn refresh(&self, team: &TeamId) -> Result<MergedCalendar> {
        let events = self.team_events(team)?;
        let calendar = MergedCalendar::compute(team.clone(), &events, Utc::now())?;
        self.store_merged(calendar.clone())?;
        Ok(calendar)
    }

    /// Store `event` for `team` unless it overlaps an existing event or its
    /// owner is not a member of the team.
    ///
    /// The read, the conflict check and the write are atomic with respect to
    /// other writers for the same team.
    fn admit(&self, team: &TeamId, event: Event) -> Result<Event>;

    /// Replace a stored event. Only its owner may do so, and the new times
    /// are checked against every other event of the team.
    fn update(&self, team: &TeamId, actor: &UserId, event: Event) -> Result<Event>;

    /// Delete a stored event. Only its owner may do so.
    fn remove(&self, team: &TeamId, actor: &UserId, event_id: &EventId) -> Result<Event>;
}

#[derive(Debug)]
struct TeamState {
    team: Team,
    events: Vec<Event>,
    merged: Option<MergedCalendar>,
}

impl TeamState {
    /// Commit `events` together with their freshly merged calendar.
    ///
    /// The calendar is computed first so a failing merge leaves the state
    /// untouched.
    fn commit(&mut self, events: Vec<Event>) -> Result<()> {
        let merged = MergedCalendar::compute(self.team.id.clone(), &events, Utc::now())?;
        self.events = events;
        self.merged = Some(merged);
        Ok(())
    }

    fn reject_conflicts(&self, event: &Event, others: &[Event]) -> Result<()> {
        let candidate = event.interval()?;
        let conflicts = conflict::find_event_conflicts(&candidate, others)?;
        if conflicts.is_empty() {
            return Ok(());
        }

        let ids: Vec<EventId> = conflicts.into_iter().map(|c| c.event_id).collect();
        warn!(
            team = %self.team.id,
            event = %event.id,
            conflicts = ids.len(),
            "rejected conflicting event"
        );
        Err(CalendarError::Conflict {
            event: event.id.clone(),
            conflicts: ids,
        })
    }
}

/// An [`EventRepository`] that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    teams: Mutex<HashMap<TeamId, Arc<Mutex<TeamState>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `team`.
    ///
    /// # Errors
    /// `DuplicateTeam` if a team with the same id is already registered.
    /// Membership of an existing team only changes through the actor-checked
    /// operations below.
    pub fn add_team(&self, team: Team) -> Result<()> {
        let mut teams = lock(&self.teams);
        if teams.contains_key(&team.id) {
            return Err(CalendarError::DuplicateTeam(team.id));
        }
        debug!(team = %team.id, "registered team");
        teams.insert(
            team.id.clone(),
            Arc::new(Mutex::new(TeamState {
                team,
                events: Vec::new(),
                merged: None,
            })),
        );
        Ok(())
    }

    /// Add `user` to `team` on behalf of `actor`. See [`Team::add_member`].
    #[instrument(skip(self), fields(team = %team, actor = %actor, user = %user))]
    pub fn add_member(&self, team: &TeamId, actor: &UserId, user: &UserId) -> Result<()> {
        self.with_team(team, |t| t.add_member(actor, user.clone()))?;
        info!("added member");
        Ok(())
    }

    /// Remove `user` from `team` on behalf of `actor`. See [`Team::remove_member`].
    #[instrument(skip(self), fields(team = %team, actor = %actor, user = %user))]
    pub fn remove_member(&self, team: &TeamId, actor: &UserId, user: &UserId) -> Result<()> {
        self.with_team(team, |t| t.remove_member(actor, user))?;
        info!("removed member");
        Ok(())
    }

    /// Change the role of `user` on behalf of `actor`. See [`Team::change_role`].
    #[instrument(skip(self), fields(team = %team, actor = %actor, user = %user))]
    pub fn change_role(
        &self,
        team: &TeamId,
        actor: &UserId,
        user: &UserId,
        role: Role,
    ) -> Result<()> {
        self.with_team(team, |t| t.change_role(actor, user, role))?;
        info!(?role, "changed member role");
        Ok(())
    }

    /// `user` leaves `team`. See [`Team::leave`].
    #[instrument(skip(self), fields(team = %team, user = %user))]
    pub fn leave(&self, team: &TeamId, user: &UserId) -> Result<()> {
        self.with_team(team, |t| t.leave(user))?;
        info!("member left");
        Ok(())
    }

    /// Apply a membership change under the team lock. A failed change leaves
    /// the membership untouched.
    fn with_team(
        &self,
        team: &TeamId,
        change: impl FnOnce(&mut Team) -> Result<()>,
    ) -> Result<()> {
        let state = self.state(team)?;
        let mut state = lock(&state);
        let mut updated = state.team.clone();
        if let Err(err) = change(&mut updated) {
            warn!(error = %err, "rejected membership change");
            return Err(err);
        }
        state.team = updated;
        Ok(())
    }

    /// The membership of `team`.
    pub fn team(&self, team: &TeamId) -> Result<Team> {
        let state = self.state(team)?;
        let team = lock(&state).team.clone();
        Ok(team)
    }

    fn state(&self, team: &TeamId) -> Result<Arc<Mutex<TeamState>>> {
        lock(&self.teams)
            .get(team)
            .cloned()
            .ok_or_else(|| CalendarError::UnknownTeam(team.clone()))
    }
}

impl EventRepository for InMemoryRepository {
    fn teams(&self) -> Vec<TeamId> {
        let mut ids: Vec<TeamId> = lock(&self.teams).keys().cloned().collect();
        ids.sort();
        ids
    }

    fn team_events(&self, team: &TeamId) -> Result<Vec<Event>> {
        let state = self.state(team)?;
        let events = lock(&state).events.clone();
        Ok(events)
    }

    fn store_merged(&self, calendar: MergedCalendar) -> Result<()> {
        let state = self.state(&calendar.team_id)?;
        lock(&state).merged = Some(calendar);
        Ok(())
    }

    fn merged(&self, team: &TeamId) -> Result<Option<MergedCalendar>> {
        let state = self.state(team)?;
        let merged = lock(&state).merged.clone();
        Ok(merged)
    }

    #[instrument(skip(self), fields(team = %team))]
    fn refresh(&self, team: &TeamId) -> Result<MergedCalendar> {
        let state = self.state(team)?;
        let mut state = lock(&state);
        let calendar = MergedCalendar::compute(team.clone(), &state.events, Utc::now())?;
        state.merged = Some(calendar.clone());
        debug!(segments = calendar.segments.len(), "refreshed under team lock");
        Ok(calendar)
    }

    #[instrument(skip(self, event), fields(team = %team, event = %event.id))]
    fn admit(&self, team: &TeamId, event: Event) -> Result<Event> {
        let state = self.state(team)?;
        let mut state = lock(&state);

        if !state.team.is_member(&event.owner_id) {
            return Err(CalendarError::NotMember(event.owner_id));
        }
        if state.events.iter().any(|e| e.id == event.id) {
            return Err(CalendarError::DuplicateEvent(event.id));
        }
        state.reject_conflicts(&event, &state.events)?;

        let mut events = state.events.clone();
        events.push(event.clone());
        state.commit(events)?;

        info!("admitted event");
        Ok(event)
    }

    #[instrument(skip(self, event), fields(team = %team, actor = %actor, event = %event.id))]
    fn update(&self, team: &TeamId, actor: &UserId, mut event: Event) -> Result<Event> {
        let state = self.state(team)?;
        let mut state = lock(&state);

        let index = state
            .events
            .iter()
            .position(|e| e.id == event.id)
            .ok_or_else(|| CalendarError::UnknownEvent(event.id.clone()))?;
        let owner = state.events[index].owner_id.clone();
        if owner != *actor {
            return Err(CalendarError::NotOwner {
                event: event.id,
                user: actor.clone(),
            });
        }
        // Ownership never moves to another user.
        event.owner_id = owner;

        let mut others = state.events.clone();
        others.remove(index);
        state.reject_conflicts(&event, &others)?;

        let mut events = state.events.clone();
        events[index] = event.clone();
        state.commit(events)?;

        info!("updated event");
        Ok(event)
    }

    #[instrument(skip(self), fields(team = %team, actor = %actor))]
    fn remove(&self, team: &TeamId, actor: &UserId, event_id: &EventId) -> Result<Event> {
        let state = self.state(team)?;
        let mut state = lock(&state);

        let index = state
            .events
            .iter()
            .position(|e| e.id == *event_id)
            .ok_or_else(|| CalendarError::UnknownEvent(event_id.clone()))?;
        if state.events[index].owner_id != *actor {
            return Err(CalendarError::NotOwner {
                event: event_id.clone(),
                user: actor.clone(),
            });
        }

        let mut events = state.events.clone();
        let removed = events.remove(index);
        state.commit(events)?;

        info!("removed event");
        Ok(removed)
    }
}
