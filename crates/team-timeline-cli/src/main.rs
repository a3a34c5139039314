//! `team-timeline` CLI: merge team events and check candidates for conflicts.
//!
//! ## Usage
//!
//! ```sh
//! # Merge a JSON array of events (stdin → stdout)
//! cat events.json | team-timeline merge
//!
//! # Merge from file to file
//! team-timeline merge -i events.json -o timeline.json
//!
//! # Check a candidate slot against existing events (exit code 3 on conflict)
//! team-timeline check --start 2026-03-02T09:30:00Z --end 2026-03-02T10:30:00Z -i events.json
//!
//! # Naive datetimes are read in the given IANA zone
//! team-timeline --tz Europe/Berlin check --start 2026-03-02T10:30:00 --end 2026-03-02T11:30:00 -i events.json
//!
//! # First gap of at least 60 minutes between events
//! team-timeline free --min-minutes 60 -i events.json
//! ```
//!
//! Every event needs `id`, `owner_id`, `start` and `end`. `title`,
//! `participant_ids`, `location` and `description` are optional.
//!
//! Exit codes: 0 on success, 1 on error, 2 on a usage error, 3 when `check`
//! finds a conflict.
//!
//! Set `RUST_LOG=debug` for diagnostics on stderr.

use std::collections::BTreeSet;
use std::io::{self, Read};
use std::process;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use team_timeline::conflict::{self, Conflict};
use team_timeline::{Event, EventId, MergedCalendar, TeamId, UserId};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit code of `check` when the candidate overlaps an existing event.
const CONFLICT_EXIT_CODE: i32 = 3;

#[derive(Parser)]
#[command(
    name = "team-timeline",
    version,
    about = "Merge team calendars and check event conflicts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// IANA timezone for datetimes without an offset
    #[arg(long, global = true, default_value = "UTC")]
    tz: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge events into an ordered occupied/free timeline
    Merge {
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Check whether a candidate slot overlaps existing events
    Check {
        /// Candidate start
        #[arg(long)]
        start: String,
        /// Candidate end
        #[arg(long)]
        end: String,
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Find the first free gap between events of at least the given length
    Free {
        /// Minimum gap length in minutes
        #[arg(long, default_value_t = 30)]
        min_minutes: i64,
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

/// Input format for events. Datetimes may carry an offset (RFC 3339) or be
/// naive, in which case they are read in the `--tz` zone.
#[derive(Deserialize)]
struct EventInput {
    id: String,
    #[serde(default)]
    title: String,
    owner_id: String,
    start: String,
    end: String,
    #[serde(default)]
    participant_ids: BTreeSet<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Serialize)]
struct CheckReport {
    conflict: bool,
    conflicts: Vec<ConflictOutput>,
}

/// A conflict together with the details of the event it names.
#[derive(Serialize)]
struct ConflictOutput {
    #[serde(flatten)]
    conflict: Conflict,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

impl ConflictOutput {
    fn new(conflict: Conflict, events: &[Event]) -> Self {
        let event = find_event(events, &conflict.event_id);
        Self {
            title: event.map(|e| e.title.clone()).unwrap_or_default(),
            location: event.and_then(|e| e.location.clone()),
            conflict,
        }
    }
}

fn find_event<'a>(events: &'a [Event], id: &EventId) -> Option<&'a Event> {
    events.iter().find(|e| e.id == *id)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let tz: Tz = cli
        .tz
        .parse()
        .map_err(|_| anyhow::anyhow!("Unknown timezone: '{}'", cli.tz))?;

    match cli.command {
        Commands::Merge { input, output } => {
            let events = read_events(input.as_deref(), tz)?;
            let timeline = team_timeline::merge(&events).context("Failed to merge events")?;
            debug!(events = events.len(), segments = timeline.len(), "merged");
            let json = serde_json::to_string_pretty(&timeline)?;
            write_output(output.as_deref(), &json)?;
        }
        Commands::Check { start, end, input } => {
            let start = parse_datetime(&start, tz)?;
            let end = parse_datetime(&end, tz)?;
            let candidate =
                conflict::check_candidate(start, end).context("Invalid candidate slot")?;
            let events = read_events(input.as_deref(), tz)?;
            let conflicts = conflict::find_event_conflicts(&candidate, &events)
                .context("Failed to check conflicts")?;

            let report = CheckReport {
                conflict: !conflicts.is_empty(),
                conflicts: conflicts
                    .into_iter()
                    .map(|c| ConflictOutput::new(c, &events))
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.conflict {
                process::exit(CONFLICT_EXIT_CODE);
            }
        }
        Commands::Free { min_minutes, input } => {
            let events = read_events(input.as_deref(), tz)?;
            let calendar = MergedCalendar::compute(TeamId::new("cli"), &events, Utc::now())
                .context("Failed to merge events")?;
            let slot = calendar.first_free_slot(min_minutes);
            println!("{}", serde_json::to_string_pretty(&slot)?);
        }
    }

    Ok(())
}

/// Parse a datetime into UTC.
///
/// RFC 3339 strings keep their own offset. Naive strings
/// (`2026-03-02T09:30:00` or `2026-03-02T09:30`) are local to `tz`; during a
/// DST fold the earlier instant wins, and a time inside a DST gap is rejected.
fn parse_datetime(s: &str, tz: Tz) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .with_context(|| format!("Invalid datetime '{}'", s))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow::anyhow!("Datetime '{}' does not exist in {}", s, tz))
}

fn read_events(path: Option<&str>, tz: Tz) -> Result<Vec<Event>> {
    let raw = read_input(path)?;
    let inputs: Vec<EventInput> =
        serde_json::from_str(&raw).context("Failed to parse events JSON")?;

    inputs
        .into_iter()
        .map(|input| -> Result<Event> {
            let start = parse_datetime(&input.start, tz)?;
            let end = parse_datetime(&input.end, tz)?;
            let mut event = Event::new(input.id, input.title, input.owner_id, start, end);
            event
                .participant_ids
                .extend(input.participant_ids.into_iter().map(UserId::from));
            event.location = input.location;
            event.description = input.description;
            Ok(event)
        })
        .collect()
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
