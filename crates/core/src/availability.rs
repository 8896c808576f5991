//! # Availability Calculator
//!
//! Enumerates the appointment start times a provider can still offer within a
//! date range.
//!
//! For every calendar day (in the provider's timezone) from the day holding
//! `range_start` through the day holding `range_end`:
//!
//! 1. Days on an excluded weekday are skipped entirely
//! 2. Candidates are laid on the grid `start:00, start:00 + d, ...` up to but
//!    not including `end:00`, where `d` is the slot duration
//! 3. Candidates at or before `now` are dropped
//! 4. Candidates blocked by an existing booking are dropped
//!
//! Because days are walked in order and the grid is walked in order within a
//! day, the result is strictly ascending without any sorting.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;

use crate::{
    errors::{ShareError, ShareResult},
    models::availability::{BookedInstant, CollisionMode, Slot, SlotQuery},
};

/// Computes every open slot for `query`.
///
/// # Errors
///
/// * `ShareError::InvalidConfiguration` - the working hours are malformed, or
///   an overlap collision mode has a zero booking length
///
/// A reversed range (`range_start > range_end`) is not an error and yields an
/// empty list.
pub fn compute_available_slots(query: &SlotQuery) -> ShareResult<Vec<Slot>> {
    let hours = &query.working_hours;
    hours.validate()?;

    if query.range_start > query.range_end {
        return Ok(Vec::new());
    }

    let blocker = Blocker::new(query)?;
    let tz = hours.timezone;
    let first_day = query.range_start.with_timezone(&tz).date_naive();
    let last_day = query.range_end.with_timezone(&tz).date_naive();
    let step = hours.slot_duration_minutes as usize;

    let mut slots = Vec::with_capacity(hours.slots_per_day());
    for day in first_day.iter_days().take_while(|day| *day <= last_day) {
        if hours.excludes(day.weekday()) {
            continue;
        }

        for hour in hours.start..hours.end {
            for minute in (0..60).step_by(step) {
                let Some(candidate) = local_instant(day, hour, minute, tz) else {
                    continue;
                };
                if candidate <= query.now || blocker.blocks(candidate) {
                    continue;
                }
                slots.push(Slot::new(candidate));
            }
        }
    }

    Ok(slots)
}

/// The span of booking start times a caller must load for a query over
/// `[range_start, range_end]`.
///
/// Whole calendar days are covered, so bookings outside the exact instants of
/// the range but on its first or last day still matter. In overlap mode a
/// booking that starts before a slot can still cover it.
///
/// # Errors
///
/// * `ShareError::InvalidRange` - the widened span falls outside the
///   representable date range
pub fn booking_window(
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    collision: CollisionMode,
) -> ShareResult<(DateTime<Utc>, DateTime<Utc>)> {
    let lead = match collision {
        CollisionMode::Exact => Duration::zero(),
        CollisionMode::Overlap { booking_minutes } => Duration::minutes(i64::from(booking_minutes)),
    };
    let out_of_range = || {
        ShareError::InvalidRange(format!(
            "range {} to {} is too close to the supported date limits",
            range_start, range_end
        ))
    };

    let fetch_start = range_start
        .checked_sub_signed(Duration::days(1) + lead)
        .ok_or_else(out_of_range)?;
    let fetch_end = range_end
        .checked_add_signed(Duration::days(1))
        .ok_or_else(out_of_range)?;
    Ok((fetch_start, fetch_end))
}

/// Resolves a wall-clock time on `day` in `tz` to an absolute instant.
///
/// Times skipped by a DST jump do not exist and yield `None`; times repeated
/// by a DST fallback resolve to the earlier instant.
fn local_instant(day: NaiveDate, hour: u32, minute: u32, tz: Tz) -> Option<DateTime<Utc>> {
    let naive = day.and_hms_opt(hour, minute, 0)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

enum Blocker {
    Exact(HashSet<DateTime<Utc>>),
    Overlap {
        booked: Vec<DateTime<Utc>>,
        booking: Duration,
        slot: Duration,
    },
}

impl Blocker {
    fn new(query: &SlotQuery) -> ShareResult<Self> {
        let instants = query.booked.iter().map(|b: &BookedInstant| b.timestamp);
        match query.collision {
            CollisionMode::Exact => Ok(Blocker::Exact(instants.collect())),
            CollisionMode::Overlap { booking_minutes: 0 } => Err(ShareError::InvalidConfiguration(
                "booking length for overlap matching must be positive".to_string(),
            )),
            CollisionMode::Overlap { booking_minutes } => {
                let mut booked: Vec<_> = instants.collect();
                booked.sort_unstable();
                booked.dedup();
                Ok(Blocker::Overlap {
                    booked,
                    booking: Duration::minutes(i64::from(booking_minutes)),
                    slot: Duration::minutes(i64::from(query.working_hours.slot_duration_minutes)),
                })
            }
        }
    }

    fn blocks(&self, candidate: DateTime<Utc>) -> bool {
        match self {
            Blocker::Exact(booked) => booked.contains(&candidate),
            Blocker::Overlap {
                booked,
                booking,
                slot,
            } => {
                // Only bookings starting before the slot ends can reach it.
                let slot_end = candidate + *slot;
                let upper = booked.partition_point(|start| *start < slot_end);
                booked[..upper]
                    .iter()
                    .rev()
                    .any(|start| *start + *booking > candidate)
            }
        }
    }
}
