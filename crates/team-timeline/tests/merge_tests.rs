//! Tests for merging team events into an occupied/free timeline.

use chrono::{DateTime, TimeZone, Utc};
use team_timeline::merge::{free_spans, occupied_spans};
use team_timeline::{merge, CalendarError, Event, EventId, SegmentKind, TimelineSegment};

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, min, 0).unwrap()
}

/// Helper to create an event from hour ranges on a fixed day.
fn event(id: &str, start_hour: u32, start_min: u32, end_hour: u32, end_min: u32) -> Event {
    Event::new(
        id,
        format!("meeting {id}"),
        "alice",
        at(start_hour, start_min),
        at(end_hour, end_min),
    )
}

#[test]
fn overlapping_and_separate_events_scenario() {
    // 09:00-10:00 and 09:30-11:00 merge; 13:00-14:00 stands alone.
    let events = vec![
        event("a", 9, 0, 10, 0),
        event("b", 9, 30, 11, 0),
        event("c", 13, 0, 14, 0),
    ];

    let timeline = merge(&events).unwrap();

    assert_eq!(
        timeline,
        vec![
            TimelineSegment::occupied(at(9, 0), at(11, 0)),
            TimelineSegment::free(at(11, 0), at(13, 0)),
            TimelineSegment::occupied(at(13, 0), at(14, 0)),
        ]
    );
}

#[test]
fn empty_input_yields_empty_timeline() {
    let timeline = merge(&[]).unwrap();
    assert!(timeline.is_empty(), "no events should produce no segments");
}

#[test]
fn single_event_is_one_occupied_segment() {
    let timeline = merge(&[event("a", 9, 0, 10, 0)]).unwrap();
    assert_eq!(timeline, vec![TimelineSegment::occupied(at(9, 0), at(10, 0))]);
}

#[test]
fn touching_events_merge_without_free_gap() {
    let events = vec![event("a", 9, 0, 10, 0), event("b", 10, 0, 11, 0)];

    let timeline = merge(&events).unwrap();

    assert_eq!(
        timeline,
        vec![TimelineSegment::occupied(at(9, 0), at(11, 0))],
        "back-to-back events render as one continuous block"
    );
}

#[test]
fn contained_event_is_absorbed() {
    // 09:00-12:00 fully contains 10:00-11:00; the later 13:00 event is separate.
    let events = vec![
        event("outer", 9, 0, 12, 0),
        event("inner", 10, 0, 11, 0),
        event("later", 13, 0, 14, 0),
    ];

    let timeline = merge(&events).unwrap();

    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline[0], TimelineSegment::occupied(at(9, 0), at(12, 0)));
    assert_eq!(timeline[1], TimelineSegment::free(at(12, 0), at(13, 0)));
    assert_eq!(timeline[2].duration_minutes(), 60);
}

#[test]
fn unsorted_input_is_sorted_and_not_mutated() {
    let events = vec![
        event("c", 15, 0, 16, 0),
        event("a", 9, 0, 10, 0),
        event("b", 12, 0, 13, 0),
    ];
    let snapshot = events.clone();

    let timeline = merge(&events).unwrap();

    assert_eq!(events, snapshot, "merge must not reorder its input");
    let kinds: Vec<SegmentKind> = timeline.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SegmentKind::Occupied,
            SegmentKind::Free,
            SegmentKind::Occupied,
            SegmentKind::Free,
            SegmentKind::Occupied,
        ]
    );
    assert_eq!(timeline[0].start, at(9, 0));
    assert_eq!(timeline[4].end, at(16, 0));
}

#[test]
fn same_start_different_lengths_extend_to_longest() {
    let events = vec![event("long", 9, 0, 11, 0), event("short", 9, 0, 9, 30)];

    let timeline = merge(&events).unwrap();

    assert_eq!(timeline, vec![TimelineSegment::occupied(at(9, 0), at(11, 0))]);
}

#[test]
fn cascading_overlaps_collapse_into_one_block() {
    let events = vec![
        event("a", 9, 0, 10, 30),
        event("b", 10, 0, 11, 30),
        event("c", 11, 0, 12, 0),
    ];

    let timeline = merge(&events).unwrap();

    assert_eq!(timeline, vec![TimelineSegment::occupied(at(9, 0), at(12, 0))]);
}

#[test]
fn malformed_interval_fails_with_event_id() {
    let events = vec![event("good", 8, 0, 9, 0), event("backwards", 10, 0, 9, 0)];

    let err = merge(&events).unwrap_err();

    assert_eq!(
        err,
        CalendarError::InvalidInterval {
            event_id: Some(EventId::new("backwards")),
            start: at(10, 0),
            end: at(9, 0),
        }
    );
    assert!(err.to_string().contains("backwards"));
}

#[test]
fn zero_length_event_is_rejected() {
    let err = merge(&[event("instant", 9, 0, 9, 0)]).unwrap_err();
    assert!(matches!(err, CalendarError::InvalidInterval { .. }));
}

#[test]
fn occupied_and_free_spans_split_the_timeline() {
    let events = vec![event("a", 9, 0, 10, 0), event("b", 11, 0, 12, 0)];
    let timeline = merge(&events).unwrap();

    let occupied = occupied_spans(&timeline).unwrap();
    let free = free_spans(&timeline).unwrap();

    assert_eq!(occupied.len(), 2);
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].start(), at(10, 0));
    assert_eq!(free[0].end(), at(11, 0));
}

#[test]
fn timeline_serializes_with_lowercase_kinds() {
    let timeline = merge(&[event("a", 9, 0, 10, 0)]).unwrap();
    let json = serde_json::to_string(&timeline).unwrap();
    assert!(json.contains(r#""kind":"occupied""#), "got {json}");
}

#[test]
fn spans_of_hand_built_backwards_segment_fail() {
    let timeline = vec![
        TimelineSegment::occupied(at(9, 0), at(10, 0)),
        TimelineSegment::free(at(11, 0), at(10, 0)),
    ];

    assert_eq!(occupied_spans(&timeline).unwrap().len(), 1);
    assert!(
        matches!(
            free_spans(&timeline),
            Err(CalendarError::InvalidInterval { event_id: None, .. })
        ),
        "a malformed segment must be reported, not skipped"
    );
}

#[test]
fn chain_of_touching_events_is_one_block() {
    let events = vec![
        event("c", 11, 0, 12, 0),
        event("a", 9, 0, 10, 0),
        event("b", 10, 0, 11, 0),
    ];

    let timeline = merge(&events).unwrap();

    assert_eq!(timeline, vec![TimelineSegment::occupied(at(9, 0), at(12, 0))]);
}
