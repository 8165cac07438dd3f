//! Digest schedule matching.
//!
//! A digest config names a delivery time (`HH:MM`), an IANA timezone, and
//! a set of weekdays. The scheduler ticks every 15 minutes; a config
//! matches when the tick's wall-clock time in the config's zone, floored
//! to the quarter-hour, equals the configured time on a configured day.
//! All functions take `now` as an argument so the rules stay clock-free.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::CoreError;

/// Scheduler cadence. Delivery times are matched on this granularity.
pub const TICK_MINUTES: u32 = 15;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse an IANA timezone name (e.g. `"Europe/Berlin"`).
pub fn parse_timezone(name: &str) -> Result<Tz, CoreError> {
    name.parse::<Tz>()
        .map_err(|_| CoreError::Validation(format!("Unknown timezone: {name}")))
}

/// Parse a `HH:MM` delivery time.
pub fn parse_delivery_time(value: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| CoreError::Validation(format!("Invalid delivery time: {value}")))
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Floor a time to the nearest quarter-hour boundary at or before it.
///
/// `09:07` and `09:14` floor to `09:00`; `09:15` floors to `09:15`.
pub fn floor_to_quarter_hour(time: NaiveTime) -> NaiveTime {
    let minute = time.minute() - time.minute() % TICK_MINUTES;
    NaiveTime::from_hms_opt(time.hour(), minute, 0).expect("floored time is always valid")
}

/// Whether a tick at `now` (UTC) matches a config's schedule.
///
/// `weekdays` uses the provider's convention: 0 = Sunday .. 6 = Saturday.
pub fn matches_schedule(
    now: DateTime<Utc>,
    tz: Tz,
    deliver_at: NaiveTime,
    weekdays: &[i16],
) -> bool {
    let local = now.with_timezone(&tz);
    let weekday = local.weekday().num_days_from_sunday() as i16;
    if !weekdays.contains(&weekday) {
        return false;
    }
    floor_to_quarter_hour(local.time()) == deliver_at
}

/// The UTC bounds of "today" in the given timezone:
/// `[local midnight, next local midnight)`.
///
/// Used by the already-sent-today check, so a digest sent at 23:59 local
/// still counts for that day and one sent at 00:01 counts for the next.
pub fn local_day_bounds(now: DateTime<Utc>, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_date = now.with_timezone(&tz).date_naive();
    let midnight = local_date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid");

    // DST gaps can make an exact local midnight ambiguous or nonexistent;
    // `earliest` falls forward to the first representable instant.
    let start = tz
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight));
    let end = tz
        .from_local_datetime(&(midnight + Duration::days(1)))
        .earliest()
        .unwrap_or_else(|| start + Duration::days(1));

    (start.with_timezone(&Utc), end.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
