//! Periodic recomputation of every team's merged calendar.
//!
//! The merge engine never schedules itself. This module is the external
//! trigger: it asks a repository for each team's events, merges them and
//! stores the result. A cached calendar may be stale by up to one refresh
//! interval, which callers accept.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calendar::MergedCalendar;
use crate::error::Result;
use crate::event::TeamId;
use crate::repository::EventRepository;

const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;

/// Settings for the background refresh loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between two refresh passes. Hourly by default.
    pub refresh_interval_secs: u64,
    /// Run a pass immediately instead of waiting one interval first.
    pub run_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            run_on_start: true,
        }
    }
}

impl SchedulerConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// Outcome of one refresh pass over all teams.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub refreshed: Vec<TeamId>,
    /// Teams whose calendar could not be rebuilt, with the reason.
    pub failed: Vec<(TeamId, String)>,
}

/// Rebuild and store the merged calendar of one team through
/// [`EventRepository::refresh`].
///
/// # Errors
/// Fails if the team is unknown or one of its events has an invalid
/// interval. The previously cached calendar is left in place.
pub fn refresh_team<R: EventRepository + ?Sized>(repo: &R, team: &TeamId) -> Result<MergedCalendar> {
    let calendar = repo.refresh(team)?;
    debug!(team = %team, segments = calendar.segments.len(), "refreshed team calendar");
    Ok(calendar)
}

/// Refresh every team. A failing team is logged and skipped.
pub fn refresh_all<R: EventRepository + ?Sized>(repo: &R) -> RefreshReport {
    let mut report = RefreshReport::default();

    for team in repo.teams() {
        match refresh_team(repo, &team) {
            Ok(_) => report.refreshed.push(team),
            Err(err) => {
                warn!(team = %team, error = %err, "failed to refresh team calendar");
                report.failed.push((team, err.to_string()));
            }
        }
    }

    info!(
        refreshed = report.refreshed.len(),
        failed = report.failed.len(),
        "team calendars merged"
    );
    report
}

/// Runs [`refresh_all`] on a background thread at a fixed interval.
pub struct RefreshScheduler;

impl RefreshScheduler {
    pub fn spawn(repo: Arc<dyn EventRepository>, config: SchedulerConfig) -> RefreshHandle {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let interval = config.refresh_interval();

        let thread = thread::spawn(move || {
            if config.run_on_start {
                refresh_all(&*repo);
            }
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        refresh_all(&*repo);
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("refresh scheduler stopped");
        });

        RefreshHandle {
            stop: stop_tx,
            thread: Some(thread),
        }
    }
}

/// Handle to a running [`RefreshScheduler`]. Dropping it stops the loop.
pub struct RefreshHandle {
    stop: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Stop the loop and wait for the current pass to finish.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        let _ = self.stop.send(());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("refresh scheduler thread panicked");
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
