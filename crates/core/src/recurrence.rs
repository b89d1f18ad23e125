// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Next-occurrence computation for recurring alarms.
//!
//! Pure and deterministic: given the same event, VALARM, and last fire
//! date, the same answer comes back regardless of host timezone. All
//! arithmetic happens in UTC.

use crate::ical::{VAlarm, VEvent};
use chrono::{DateTime, Utc};
use rrule::{RRuleSet, Tz};

/// Compute the next due date of a recurring alarm.
///
/// The alarm's fire instant is always `occurrence_start + trigger`, so
/// the occurrence that produced `last_fire_date` started at
/// `last_fire_date - trigger`. Expansion seeds from that instant (or
/// from DTSTART when nothing has fired yet) and takes the first
/// occurrence strictly after it.
///
/// Returns `None` when the event is not recurring, the VALARM has no
/// trigger, the rule is malformed, or the recurrence is exhausted
/// (COUNT/UNTIL consumed) — a one-shot alarm has no successor.
pub fn compute_next_due_date(
    event: &VEvent,
    valarm: &VAlarm,
    last_fire_date: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    let rrule = event.rrule.as_deref()?;
    let trigger = valarm.trigger?.to_chrono();

    let seed = match last_fire_date {
        Some(fired) => fired - trigger,
        None => event.dtstart,
    };

    let source = format!(
        "DTSTART:{}\nRRULE:{}",
        event.dtstart.format("%Y%m%dT%H%M%SZ"),
        rrule
    );
    let set: RRuleSet = match source.parse() {
        Ok(set) => set,
        Err(e) => {
            tracing::debug!(uid = %event.uid, error = %e, "unparseable RRULE, ending alarm sequence");
            return None;
        }
    };

    let seed_utc = seed.with_timezone(&Tz::UTC);
    // The expansion lower bound is inclusive: the seed occurrence
    // itself can come back as the "first" result. Taking it would
    // re-fire the same alarm forever, so anything not strictly after
    // the seed is discarded.
    let expansion = set.after(seed_utc).all(2);
    let next_start = expansion
        .dates
        .into_iter()
        .map(|d| d.with_timezone(&Utc))
        .find(|start| *start > seed)?;

    Some(next_start + trigger)
}

#[cfg(test)]
#[path = "recurrence_tests.rs"]
mod tests;
