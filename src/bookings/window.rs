//! Local calendar-day windows for the reservation query.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};

/// Timestamp format the booking platform filters accept.
pub const UPSTREAM_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Last representable instant of a day, relative to midnight.
const END_OF_DAY_MILLIS: i64 = 24 * 60 * 60 * 1000 - 1;

/// Step used to walk out of a DST gap, and how many steps to try.
const GAP_STEP_MINUTES: i64 = 15;
const GAP_MAX_STEPS: usize = 16;

/// One local calendar day, 00:00:00.000 to 23:59:59.999, as UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// The server's current local day.
    pub fn today() -> Self {
        Self::containing(&Local::now())
    }

    /// The local day (in the instant's own zone) containing `instant`.
    pub fn containing<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self::for_date(&instant.timezone(), instant.date_naive())
    }

    /// A given calendar date in a given zone.
    pub fn for_date<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Self {
        let midnight = date.and_time(chrono::NaiveTime::MIN);
        let last_milli = midnight + TimeDelta::milliseconds(END_OF_DAY_MILLIS);

        Self {
            start: resolve_local(tz, midnight, Pick::Earliest),
            end: resolve_local(tz, last_milli, Pick::Latest),
        }
    }

    /// Start of the window as sent upstream (no fractional seconds).
    pub fn start_param(&self) -> String {
        self.start.format(UPSTREAM_TIMESTAMP_FORMAT).to_string()
    }

    /// End of the window as sent upstream (no fractional seconds).
    pub fn end_param(&self) -> String {
        self.end.format(UPSTREAM_TIMESTAMP_FORMAT).to_string()
    }
}

#[derive(Clone, Copy)]
enum Pick {
    Earliest,
    Latest,
}

/// Map a wall-clock time to an instant.
///
/// Ambiguous times (DST fall-back) take the earliest or latest mapping.
/// Non-existent times (DST spring-forward) are walked away from the day's
/// edge, forwards for the start and backwards for the end.
fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime, pick: Pick) -> DateTime<Utc> {
    let step = match pick {
        Pick::Earliest => TimeDelta::minutes(GAP_STEP_MINUTES),
        Pick::Latest => -TimeDelta::minutes(GAP_STEP_MINUTES),
    };

    let mut probe = local;
    for _ in 0..=GAP_MAX_STEPS {
        let mapped = tz.from_local_datetime(&probe);
        let chosen = match pick {
            Pick::Earliest => mapped.earliest(),
            Pick::Latest => mapped.latest(),
        };
        if let Some(instant) = chosen {
            return instant.with_timezone(&Utc);
        }
        probe += step;
    }

    tz.from_utc_datetime(&local).with_timezone(&Utc)
}
