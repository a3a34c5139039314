//! Tests for periodic calendar refresh.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use team_timeline::repository::EventRepository;
use team_timeline::scheduler::{refresh_all, refresh_team, RefreshScheduler, SchedulerConfig};
use team_timeline::{
    CalendarError, Event, InMemoryRepository, MergedCalendar, Result, Team, TeamId, UserId,
};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, hour, 0, 0).unwrap()
}

/// A repository whose events bypass admission, so one team can hold a
/// malformed event.
struct SeededRepository {
    events: Vec<(TeamId, Vec<Event>)>,
    stored: InMemoryRepository,
}

impl SeededRepository {
    fn new(events: Vec<(TeamId, Vec<Event>)>) -> Self {
        let stored = InMemoryRepository::new();
        for (team, _) in &events {
            stored
                .add_team(Team::new(team.clone(), team.as_str(), "admin"))
                .unwrap();
        }
        Self { events, stored }
    }
}

impl EventRepository for SeededRepository {
    fn teams(&self) -> Vec<TeamId> {
        self.events.iter().map(|(team, _)| team.clone()).collect()
    }

    fn team_events(&self, team: &TeamId) -> Result<Vec<Event>> {
        self.events
            .iter()
            .find(|(id, _)| id == team)
            .map(|(_, events)| events.clone())
            .ok_or_else(|| CalendarError::UnknownTeam(team.clone()))
    }

    fn store_merged(&self, calendar: MergedCalendar) -> Result<()> {
        self.stored.store_merged(calendar)
    }

    fn merged(&self, team: &TeamId) -> Result<Option<MergedCalendar>> {
        self.stored.merged(team)
    }

    fn admit(&self, team: &TeamId, event: Event) -> Result<Event> {
        self.stored.admit(team, event)
    }

    fn update(&self, team: &TeamId, actor: &UserId, event: Event) -> Result<Event> {
        self.stored.update(team, actor, event)
    }

    fn remove(&self, team: &TeamId, actor: &UserId, event_id: &team_timeline::EventId) -> Result<Event> {
        self.stored.remove(team, actor, event_id)
    }
}

#[test]
fn config_defaults_to_hourly() {
    let config = SchedulerConfig::default();
    assert_eq!(config.refresh_interval(), Duration::from_secs(3600));
    assert!(config.run_on_start);
}

#[test]
fn config_from_json_fills_missing_fields() {
    let config = SchedulerConfig::from_json(r#"{"refresh_interval_secs": 60}"#).unwrap();
    assert_eq!(config.refresh_interval_secs, 60);
    assert!(config.run_on_start);

    assert!(SchedulerConfig::from_json(r#"{"refresh_interval_secs": "soon"}"#).is_err());
}

#[test]
fn refresh_team_stores_calendar() {
    let team = TeamId::new("core");
    let repo = SeededRepository::new(vec![(
        team.clone(),
        vec![Event::new("a", "a", "alice", at(9), at(10))],
    )]);

    let calendar = refresh_team(&repo, &team).unwrap();

    assert_eq!(calendar.segments.len(), 1);
    assert_eq!(repo.merged(&team).unwrap(), Some(calendar));
}

#[test]
fn refresh_all_continues_past_failing_team() {
    let good = TeamId::new("good");
    let bad = TeamId::new("bad");
    let repo = SeededRepository::new(vec![
        (bad.clone(), vec![Event::new("broken", "x", "bob", at(11), at(10))]),
        (good.clone(), vec![Event::new("ok", "y", "alice", at(9), at(10))]),
    ]);

    let report = refresh_all(&repo);

    assert_eq!(report.refreshed, vec![good.clone()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, bad);
    assert!(report.failed[0].1.contains("broken"));
    assert!(repo.merged(&good).unwrap().is_some());
    assert!(repo.merged(&bad).unwrap().is_none(), "no partial calendar is cached");
}

#[test]
fn scheduler_runs_on_start_and_shuts_down() {
    let repo = Arc::new(InMemoryRepository::new());
    repo.add_team(Team::new("core", "Core", "alice")).unwrap();
    let team = TeamId::new("core");

    let handle = RefreshScheduler::spawn(
        repo.clone(),
        SchedulerConfig {
            refresh_interval_secs: 3600,
            run_on_start: true,
        },
    );

    let deadline = Instant::now() + Duration::from_secs(5);
    while repo.merged(&team).unwrap().is_none() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(repo.merged(&team).unwrap().is_some());

    let started = Instant::now();
    handle.shutdown();
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "shutdown must not wait for the next interval"
    );
}
