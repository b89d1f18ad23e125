// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Narrow parsed view of a stored vcalendar snapshot.
//!
//! The full iCal/jCal stack lives in the platform's calendar parsing
//! library; alarms only need a handful of properties out of the
//! serialized snapshot they carry: the VEVENT start, UID, recurrence
//! rule, and each VALARM's action, trigger, and attendee. Everything
//! else is ignored.

use crate::alarm::AlarmAction;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from snapshot parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IcalError {
    /// The snapshot contains no VEVENT component.
    #[error("no VEVENT component in snapshot")]
    MissingVEvent,

    /// A required property is absent from the VEVENT.
    #[error("VEVENT is missing required property {name}")]
    MissingProperty { name: &'static str },

    /// A DTSTART value that is neither a date-time nor a date.
    #[error("invalid date-time value '{value}'")]
    InvalidDateTime { value: String },

    /// A duration value that does not follow RFC 5545 dur-value syntax.
    #[error("invalid duration value '{value}'")]
    InvalidDuration { value: String },
}

/// Signed RFC 5545 duration, as used by the VALARM TRIGGER property.
///
/// `-P1D` means one day before the related instant; a positive value
/// fires after it. Weeks are kept distinct from days so Display
/// round-trips the original form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDuration {
    pub negative: bool,
    pub weeks: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TriggerDuration {
    /// Parse an RFC 5545 dur-value, e.g. `-P1D`, `PT15M`, `P1W`, `-PT1H30M`.
    pub fn parse(value: &str) -> Result<Self, IcalError> {
        let invalid = || IcalError::InvalidDuration { value: value.to_string() };
        let s = value.trim();
        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let body = rest.strip_prefix('P').ok_or_else(invalid)?;
        if body.is_empty() {
            return Err(invalid());
        }

        let mut out =
            TriggerDuration { negative, weeks: 0, days: 0, hours: 0, minutes: 0, seconds: 0 };
        let mut in_time = false;
        let mut digits = String::new();
        let mut saw_component = false;

        for ch in body.chars() {
            match ch {
                'T' | 't' if !in_time && digits.is_empty() => in_time = true,
                '0'..='9' => digits.push(ch),
                unit => {
                    let n: i64 = digits.parse().map_err(|_| invalid())?;
                    digits.clear();
                    saw_component = true;
                    match (unit.to_ascii_uppercase(), in_time) {
                        ('W', false) => out.weeks = n,
                        ('D', false) => out.days = n,
                        ('H', true) => out.hours = n,
                        ('M', true) => out.minutes = n,
                        ('S', true) => out.seconds = n,
                        _ => return Err(invalid()),
                    }
                }
            }
        }
        if !digits.is_empty() || !saw_component {
            return Err(invalid());
        }
        Ok(out)
    }

    /// Signed chrono duration for date arithmetic.
    pub fn to_chrono(&self) -> chrono::Duration {
        let magnitude = chrono::Duration::weeks(self.weeks)
            + chrono::Duration::days(self.days)
            + chrono::Duration::hours(self.hours)
            + chrono::Duration::minutes(self.minutes)
            + chrono::Duration::seconds(self.seconds);
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }
}

impl std::fmt::Display for TriggerDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        if self.weeks > 0 {
            write!(f, "{}W", self.weeks)?;
        }
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.hours > 0 || self.minutes > 0 || self.seconds > 0 {
            f.write_str("T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds > 0 {
                write!(f, "{}S", self.seconds)?;
            }
        } else if self.weeks == 0 && self.days == 0 {
            f.write_str("T0S")?;
        }
        Ok(())
    }
}

/// One VALARM sub-component of the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VAlarm {
    /// Parsed ACTION, `None` for channels the engine does not know.
    pub action: Option<AlarmAction>,
    /// TRIGGER offset relative to the event start. A VALARM without a
    /// trigger is a one-shot that cannot recur.
    pub trigger: Option<TriggerDuration>,
    /// ATTENDEE value with any `mailto:` prefix stripped.
    pub attendee: Option<String>,
}

/// The parsed VEVENT of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VEvent {
    pub uid: String,
    pub dtstart: DateTime<Utc>,
    /// Raw RRULE property value, e.g. `FREQ=WEEKLY;COUNT=4`.
    pub rrule: Option<String>,
    pub summary: Option<String>,
    pub valarms: Vec<VAlarm>,
}

impl VEvent {
    pub fn is_recurring(&self) -> bool {
        self.rrule.is_some()
    }
}

/// Parsed view of a full vcalendar snapshot (first VEVENT only —
/// alarm rows are always tagged with a single-event snapshot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSnapshot {
    pub event: VEvent,
}

impl CalendarSnapshot {
    pub fn parse(ics: &str) -> Result<Self, IcalError> {
        let lines = unfold(ics);

        let mut event: Option<PartialEvent> = None;
        let mut alarm: Option<VAlarm> = None;
        let mut done = false;

        for line in &lines {
            let Some(prop) = Property::parse(line) else { continue };
            match (prop.name.as_str(), prop.value.trim()) {
                ("BEGIN", "VEVENT") if event.is_none() && !done => {
                    event = Some(PartialEvent::default());
                }
                ("END", "VEVENT") => {
                    if event.is_some() {
                        done = true;
                    }
                }
                ("BEGIN", "VALARM") if event.is_some() && !done => {
                    alarm = Some(VAlarm { action: None, trigger: None, attendee: None });
                }
                ("END", "VALARM") => {
                    if let (Some(ev), Some(va)) = (event.as_mut(), alarm.take()) {
                        ev.valarms.push(va);
                    }
                }
                _ if done => {}
                _ => {
                    if let Some(va) = alarm.as_mut() {
                        va.apply(&prop)?;
                    } else if let Some(ev) = event.as_mut() {
                        ev.apply(&prop)?;
                    }
                }
            }
        }

        let partial = event.ok_or(IcalError::MissingVEvent)?;
        Ok(Self { event: partial.finish()? })
    }
}

#[derive(Default)]
struct PartialEvent {
    uid: Option<String>,
    dtstart: Option<DateTime<Utc>>,
    rrule: Option<String>,
    summary: Option<String>,
    valarms: Vec<VAlarm>,
}

impl PartialEvent {
    fn apply(&mut self, prop: &Property) -> Result<(), IcalError> {
        match prop.name.as_str() {
            "UID" => self.uid = Some(prop.value.trim().to_string()),
            "DTSTART" => self.dtstart = Some(parse_datetime(prop.value.trim())?),
            "RRULE" => self.rrule = Some(prop.value.trim().to_string()),
            "SUMMARY" => self.summary = Some(prop.value.trim().to_string()),
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<VEvent, IcalError> {
        Ok(VEvent {
            uid: self.uid.ok_or(IcalError::MissingProperty { name: "UID" })?,
            dtstart: self.dtstart.ok_or(IcalError::MissingProperty { name: "DTSTART" })?,
            rrule: self.rrule,
            summary: self.summary,
            valarms: self.valarms,
        })
    }
}

impl VAlarm {
    fn apply(&mut self, prop: &Property) -> Result<(), IcalError> {
        match prop.name.as_str() {
            "ACTION" => self.action = AlarmAction::parse(&prop.value),
            "TRIGGER" => self.trigger = Some(TriggerDuration::parse(&prop.value)?),
            "ATTENDEE" => {
                let value = prop.value.trim();
                let bare = value
                    .strip_prefix("mailto:")
                    .or_else(|| value.strip_prefix("MAILTO:"))
                    .unwrap_or(value);
                self.attendee = Some(bare.to_string());
            }
            _ => {}
        }
        Ok(())
    }
}

/// One content line split into name, parameters, and value.
struct Property {
    name: String,
    value: String,
}

impl Property {
    fn parse(line: &str) -> Option<Self> {
        let colon = line.find(':')?;
        let (head, value) = line.split_at(colon);
        // parameters (";TZID=..." etc.) are dropped; the engine only
        // consumes UTC and floating values
        let name = head.split(';').next().unwrap_or(head);
        Some(Self { name: name.trim().to_ascii_uppercase(), value: value[1..].to_string() })
    }
}

/// Undo RFC 5545 line folding: a line starting with space or tab
/// continues the previous line.
fn unfold(ics: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in ics.lines() {
        if raw.starts_with(' ') || raw.starts_with('\t') {
            if let Some(last) = out.last_mut() {
                last.push_str(&raw[1..]);
                continue;
            }
        }
        out.push(raw.trim_end_matches('\r').to_string());
    }
    out
}

/// Parse an iCalendar DATE-TIME or DATE value as a UTC instant.
///
/// Floating date-times (no trailing `Z`) are treated as UTC — the
/// platform normalizes event starts before snapshots reach the store.
fn parse_datetime(value: &str) -> Result<DateTime<Utc>, IcalError> {
    let invalid = || IcalError::InvalidDateTime { value: value.to_string() };
    let bare = value.strip_suffix('Z').unwrap_or(value);
    if let Ok(dt) = NaiveDateTime::parse_from_str(bare, "%Y%m%dT%H%M%S") {
        return Ok(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(bare, "%Y%m%d") {
        let midnight = d.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
        return Ok(midnight.and_utc());
    }
    Err(invalid())
}

#[cfg(test)]
#[path = "ical_tests.rs"]
mod tests;
