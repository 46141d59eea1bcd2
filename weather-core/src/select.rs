//! Picks the forecast bucket that best represents a calendar day.
//!
//! Buckets are about 3 hours apart and never land exactly on noon, so the
//! selector prefers the first midday bucket (12..=15 local), then the first
//! afternoon bucket (15..=18), then whichever is closest to 12:00.

use chrono::{DateTime, NaiveDate, TimeZone, Timelike};

use crate::model::ForecastSample;

const MIDDAY: u32 = 12;

fn local_date_hour<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Option<(NaiveDate, u32)> {
    let local = DateTime::from_timestamp(timestamp, 0)?.with_timezone(tz);
    Some((local.date_naive(), local.hour()))
}

/// Select the most representative sample for `target`, with calendar dates and
/// hours taken in `tz`. Returns `None` when no sample falls on `target`.
pub fn select_sample<'a, Tz: TimeZone>(
    samples: &'a [ForecastSample],
    target: NaiveDate,
    tz: &Tz,
) -> Option<&'a ForecastSample> {
    let mut day: Vec<(u32, &ForecastSample)> = samples
        .iter()
        .filter_map(|s| match local_date_hour(s.timestamp(), tz) {
            Some((date, hour)) if date == target => Some((hour, s)),
            _ => None,
        })
        .collect();

    // stable: equal timestamps keep input order
    day.sort_by_key(|(_, s)| s.timestamp());

    let first_in = |from: u32, to: u32| {
        day.iter()
            .find(|(hour, _)| (from..=to).contains(hour))
            .map(|(_, s)| *s)
    };

    first_in(12, 15).or_else(|| first_in(15, 18)).or_else(|| {
        day.iter()
            .min_by_key(|(hour, _)| hour.abs_diff(MIDDAY))
            .map(|(_, s)| *s)
    })
}

/// Distinct calendar dates (in `tz`) present in `samples`, in first-seen order,
/// capped at `limit`.
pub fn available_dates<Tz: TimeZone>(
    samples: &[ForecastSample],
    tz: &Tz,
    limit: usize,
) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = Vec::new();
    for (date, _) in samples.iter().filter_map(|s| local_date_hour(s.timestamp(), tz)) {
        if !dates.contains(&date) {
            dates.push(date);
        }
    }
    dates.truncate(limit);
    dates
}
