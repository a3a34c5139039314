//! Team membership and role ranks.
//!
//! Membership changes go through an acting user whose role is compared by
//! rank. Adding, removing and re-ranking members takes an admin. A team never
//! loses its last admin while other members remain: promote someone first.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};
use crate::event::{Event, TeamId, UserId};

/// Team role, ordered by rank: `Member < Moderator < Admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Moderator,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub members: Vec<Membership>,
}

impl Team {
    /// Create a team whose creator is its admin.
    pub fn new(id: impl Into<TeamId>, name: impl Into<String>, admin: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            members: vec![Membership {
                user_id: admin.into(),
                role: Role::Admin,
            }],
        }
    }

    pub fn role_of(&self, user: &UserId) -> Option<Role> {
        self.members
            .iter()
            .find(|m| m.user_id == *user)
            .map(|m| m.role)
    }

    /// Whether `user` is a member holding `role` or a higher one.
    pub fn has_role_at_least(&self, user: &UserId, role: Role) -> bool {
        self.role_of(user).is_some_and(|held| held >= role)
    }

    pub fn is_member(&self, user: &UserId) -> bool {
        self.role_of(user).is_some()
    }

    pub fn member_ids(&self) -> BTreeSet<UserId> {
        self.members.iter().map(|m| m.user_id.clone()).collect()
    }

    /// Add `user` as a plain member.
    ///
    /// # Errors
    /// `NotPermitted` unless `actor` is an admin, `AlreadyMember` if `user`
    /// is already on the team.
    pub fn add_member(&mut self, actor: &UserId, user: impl Into<UserId>) -> Result<()> {
        self.require(actor, Role::Admin)?;
        let user = user.into();
        if self.is_member(&user) {
            return Err(CalendarError::AlreadyMember(user));
        }
        self.members.push(Membership {
            user_id: user,
            role: Role::Member,
        });
        Ok(())
    }

    /// Remove `user` from the team.
    ///
    /// # Errors
    /// `NotPermitted` unless `actor` is an admin, `NotMember` if `user` is not
    /// on the team, `LastAdmin` if it would strand the remaining members
    /// without an admin.
    pub fn remove_member(&mut self, actor: &UserId, user: &UserId) -> Result<()> {
        self.require(actor, Role::Admin)?;
        self.drop_member(user)
    }

    /// Give `user` a new role.
    ///
    /// # Errors
    /// `NotPermitted` unless `actor` is an admin, `NotMember` if `user` is not
    /// on the team, `LastAdmin` when demoting the only admin.
    pub fn change_role(&mut self, actor: &UserId, user: &UserId, role: Role) -> Result<()> {
        self.require(actor, Role::Admin)?;
        let current = self
            .role_of(user)
            .ok_or_else(|| CalendarError::NotMember(user.clone()))?;
        if current == Role::Admin && role < Role::Admin && self.admin_count() == 1 {
            return Err(CalendarError::LastAdmin(user.clone()));
        }
        if let Some(membership) = self.members.iter_mut().find(|m| m.user_id == *user) {
            membership.role = role;
        }
        Ok(())
    }

    /// `user` leaves the team. Any member may leave, except the last admin
    /// while other members remain.
    ///
    /// # Errors
    /// `NotMember` or `LastAdmin`.
    pub fn leave(&mut self, user: &UserId) -> Result<()> {
        self.drop_member(user)
    }

    fn drop_member(&mut self, user: &UserId) -> Result<()> {
        let index = self
            .members
            .iter()
            .position(|m| m.user_id == *user)
            .ok_or_else(|| CalendarError::NotMember(user.clone()))?;
        if self.members[index].role == Role::Admin
            && self.admin_count() == 1
            && self.members.len() > 1
        {
            return Err(CalendarError::LastAdmin(user.clone()));
        }
        self.members.remove(index);
        Ok(())
    }

    fn require(&self, actor: &UserId, role: Role) -> Result<()> {
        if self.has_role_at_least(actor, role) {
            Ok(())
        } else {
            Err(CalendarError::NotPermitted {
                user: actor.clone(),
                required: role,
            })
        }
    }

    fn admin_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.role == Role::Admin)
            .count()
    }
}

/// The events that involve at least one member of `team`.
///
/// This is the input the merge engine receives for a team: every event any
/// member owns or takes part in.
pub fn events_for_team(team: &Team, events: &[Event]) -> Vec<Event> {
    let members = team.member_ids();
    events
        .iter()
        .filter(|event| members.iter().any(|member| event.involves(member)))
        .cloned()
        .collect()
}
