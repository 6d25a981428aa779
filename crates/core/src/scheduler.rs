//! Interval scheduler
//!
//! Places a duration into the first free calendar slot. First-fit, not
//! best-fit: the earliest candidate that fits wins, which keeps the search
//! deterministic and cheap.
//!
//! Search order: forward from `max(preferred_date, tomorrow)` for up to 14
//! calendar days, skipping non-working days. Each candidate day is tried
//! twice — the narrowed preferred window first, then the full working-hours
//! window. Inside a window, candidates are the gap before the first event,
//! the gaps between consecutive events, and the tail after the last event,
//! each padded by a 15-minute buffer on both sides.
//!
//! Unschedulability is never an error: after the 14-day horizon the slot is
//! forced onto day 15 at the start of working hours, conflicts or not, with
//! a warning.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use taskbridge_domain::constants::{SCHEDULING_HORIZON_DAYS, SLOT_BUFFER_MINUTES};
use taskbridge_domain::{EventStatus, ExternalEvent, SchedulingConfig, Slot};
use tracing::{debug, warn};

/// Find a free slot for the given duration.
///
/// Deterministic for identical `existing_events` and `now`; `now` must be
/// injected by the caller.
#[must_use]
pub fn find_slot(
    duration_minutes: u32,
    preferred_date: Option<NaiveDate>,
    existing_events: &[ExternalEvent],
    config: &SchedulingConfig,
    now: DateTime<Utc>,
) -> Slot {
    let duration = Duration::minutes(i64::from(duration_minutes));
    let tz = config.timezone;

    let tomorrow = now.with_timezone(&tz).date_naive() + Duration::days(1);
    let search_start = preferred_date.map_or(tomorrow, |d| d.max(tomorrow));

    // Only confirmed, timed events block placement
    let mut busy: Vec<(DateTime<Utc>, DateTime<Utc>)> = existing_events
        .iter()
        .filter(|e| e.status == EventStatus::Confirmed && !e.is_all_day)
        .map(|e| (e.start, e.end))
        .collect();
    busy.sort_by_key(|(start, _)| *start);

    for offset in 0..SCHEDULING_HORIZON_DAYS {
        let day = search_start + Duration::days(offset);
        if !config.is_working_day(day.weekday()) {
            continue;
        }

        let windows = [
            (config.preferred_start, config.preferred_end),
            (config.work_start, config.work_end),
        ];
        for (window_start, window_end) in windows {
            let (Some(start), Some(end)) =
                (to_utc(day, window_start, tz), to_utc(day, window_end, tz))
            else {
                // DST gap swallowed the window boundary; try the next one
                continue;
            };
            if let Some(slot) = first_fit(start, end, duration, &busy) {
                debug!(
                    day = %day,
                    start = %slot.start,
                    duration_minutes,
                    "slot placed"
                );
                return slot;
            }
        }
    }

    // Forced fallback: day 15 at the start of working hours, regardless of
    // conflicts. The pass must never fail on unschedulability.
    let fallback_day = search_start + Duration::days(SCHEDULING_HORIZON_DAYS);
    let start = to_utc(fallback_day, config.work_start, tz)
        .unwrap_or_else(|| Utc.from_utc_datetime(&fallback_day.and_time(config.work_start)));
    warn!(
        day = %fallback_day,
        duration_minutes,
        "no free slot within horizon, forcing fallback placement"
    );
    Slot { start, end: start + duration }
}

/// First candidate inside `[window_start, window_end]` that fits `duration`
/// while keeping the buffer distance from every busy interval.
fn first_fit(
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    duration: Duration,
    busy: &[(DateTime<Utc>, DateTime<Utc>)],
) -> Option<Slot> {
    let buffer = Duration::minutes(SLOT_BUFFER_MINUTES);
    let mut cursor = window_start;

    for &(busy_start, busy_end) in busy {
        // Expanding the busy interval by the buffer on both sides enforces
        // the required distance from adjacent events
        let padded_start = busy_start - buffer;
        let padded_end = busy_end + buffer;

        if padded_end <= cursor {
            continue;
        }
        if padded_start >= window_end {
            break;
        }

        if padded_start - cursor >= duration && cursor + duration <= window_end {
            return Some(Slot { start: cursor, end: cursor + duration });
        }
        cursor = cursor.max(padded_end);
    }

    if cursor + duration <= window_end {
        return Some(Slot { start: cursor, end: cursor + duration });
    }
    None
}

fn to_utc(date: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
