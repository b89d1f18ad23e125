// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const SINGLE_EMAIL_ALARM: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//platform//calendar//EN\r\n\
BEGIN:VEVENT\r\n\
UID:event-uid-1\r\n\
DTSTART:20300110T090000Z\r\n\
SUMMARY:Quarterly review\r\n\
BEGIN:VALARM\r\n\
ACTION:EMAIL\r\n\
TRIGGER:-P1D\r\n\
ATTENDEE:mailto:user1@example.com\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

const WEEKLY_TWO_ALARMS: &str = "BEGIN:VCALENDAR\r\n\
BEGIN:VEVENT\r\n\
UID:weekly-uid\r\n\
DTSTART:20300101T100000Z\r\n\
RRULE:FREQ=WEEKLY\r\n\
BEGIN:VALARM\r\n\
ACTION:EMAIL\r\n\
TRIGGER:-PT15M\r\n\
ATTENDEE;CN=User One:mailto:user1@example.com\r\n\
END:VALARM\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
TRIGGER:-PT5M\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

#[parameterized(
    one_day_before = { "-P1D", true, 0, 1, 0, 0, 0 },
    fifteen_minutes_before = { "-PT15M", true, 0, 0, 0, 15, 0 },
    one_week = { "P1W", false, 1, 0, 0, 0, 0 },
    mixed = { "-PT1H30M", true, 0, 0, 1, 30, 0 },
    day_and_time = { "P1DT12H", false, 0, 1, 12, 0, 0 },
    zero = { "PT0S", false, 0, 0, 0, 0, 0 },
    explicit_plus = { "+PT10S", false, 0, 0, 0, 0, 10 },
)]
fn trigger_parse(
    input: &str,
    negative: bool,
    weeks: i64,
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
) {
    let t = TriggerDuration::parse(input).unwrap();
    assert_eq!(t, TriggerDuration { negative, weeks, days, hours, minutes, seconds });
}

#[parameterized(
    empty = { "" },
    no_p = { "-1D" },
    bare_p = { "P" },
    bare_pt = { "PT" },
    trailing_digits = { "P1D2" },
    date_unit_in_time = { "PT1D" },
    time_unit_in_date = { "P15M" },
)]
fn trigger_parse_rejects(input: &str) {
    assert!(matches!(
        TriggerDuration::parse(input),
        Err(IcalError::InvalidDuration { .. })
    ));
}

#[parameterized(
    one_day = { "-P1D" },
    minutes = { "-PT15M" },
    week = { "P1W" },
    mixed = { "-PT1H30M" },
    day_and_time = { "P1DT12H" },
    zero = { "PT0S" },
)]
fn trigger_display_round_trips(input: &str) {
    let t = TriggerDuration::parse(input).unwrap();
    assert_eq!(t.to_string(), input);
    assert_eq!(TriggerDuration::parse(&t.to_string()).unwrap(), t);
}

#[test]
fn trigger_to_chrono_is_signed() {
    let t = TriggerDuration::parse("-P1D").unwrap();
    assert_eq!(t.to_chrono(), chrono::Duration::days(-1));
    let t = TriggerDuration::parse("PT15M").unwrap();
    assert_eq!(t.to_chrono(), chrono::Duration::minutes(15));
}

#[test]
fn parses_single_email_alarm_snapshot() {
    let snapshot = CalendarSnapshot::parse(SINGLE_EMAIL_ALARM).unwrap();
    let event = &snapshot.event;
    assert_eq!(event.uid, "event-uid-1");
    assert_eq!(event.dtstart, "2030-01-10T09:00:00Z".parse::<DateTime<Utc>>().unwrap());
    assert_eq!(event.summary.as_deref(), Some("Quarterly review"));
    assert!(!event.is_recurring());

    assert_eq!(event.valarms.len(), 1);
    let valarm = &event.valarms[0];
    assert_eq!(valarm.action, Some(AlarmAction::Email));
    assert_eq!(valarm.trigger, Some(TriggerDuration::parse("-P1D").unwrap()));
    assert_eq!(valarm.attendee.as_deref(), Some("user1@example.com"));
}

#[test]
fn parses_multiple_valarms_and_rrule() {
    let snapshot = CalendarSnapshot::parse(WEEKLY_TWO_ALARMS).unwrap();
    let event = &snapshot.event;
    assert!(event.is_recurring());
    assert_eq!(event.rrule.as_deref(), Some("FREQ=WEEKLY"));
    assert_eq!(event.valarms.len(), 2);
    assert_eq!(event.valarms[0].attendee.as_deref(), Some("user1@example.com"));
    assert_eq!(event.valarms[1].action, Some(AlarmAction::Display));
    assert!(event.valarms[1].attendee.is_none());
}

#[test]
fn unfolds_continuation_lines() {
    let ics = "BEGIN:VCALENDAR\r\n\
BEGIN:VEVENT\r\n\
UID:folded-uid\r\n\
DTSTART:20300110T090000Z\r\n\
SUMMARY:A very long su\r\n mmary line\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
    let snapshot = CalendarSnapshot::parse(ics).unwrap();
    assert_eq!(snapshot.event.summary.as_deref(), Some("A very long summary line"));
}

#[test]
fn unknown_action_is_kept_as_none() {
    let ics = "BEGIN:VCALENDAR\r\n\
BEGIN:VEVENT\r\n\
UID:u\r\n\
DTSTART:20300110T090000Z\r\n\
BEGIN:VALARM\r\n\
ACTION:PROCEDURE\r\n\
TRIGGER:-PT5M\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
    let snapshot = CalendarSnapshot::parse(ics).unwrap();
    assert_eq!(snapshot.event.valarms[0].action, None);
}

#[test]
fn date_only_dtstart_is_midnight_utc() {
    let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:u\r\nDTSTART;VALUE=DATE:20300110\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
    let snapshot = CalendarSnapshot::parse(ics).unwrap();
    assert_eq!(
        snapshot.event.dtstart,
        "2030-01-10T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
    );
}

#[test]
fn missing_vevent_is_an_error() {
    let err = CalendarSnapshot::parse("BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n").unwrap_err();
    assert_eq!(err, IcalError::MissingVEvent);
}

#[test]
fn missing_dtstart_is_an_error() {
    let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:u\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
    let err = CalendarSnapshot::parse(ics).unwrap_err();
    assert_eq!(err, IcalError::MissingProperty { name: "DTSTART" });
}

#[test]
fn only_first_vevent_is_read() {
    let ics = "BEGIN:VCALENDAR\r\n\
BEGIN:VEVENT\r\nUID:first\r\nDTSTART:20300110T090000Z\r\nEND:VEVENT\r\n\
BEGIN:VEVENT\r\nUID:second\r\nDTSTART:20310110T090000Z\r\nEND:VEVENT\r\n\
END:VCALENDAR\r\n";
    let snapshot = CalendarSnapshot::parse(ics).unwrap();
    assert_eq!(snapshot.event.uid, "first");
}
