//! Rain detection over hourly forecasts.
//!
//! Everything here is a pure function of its inputs: records are bucketed by
//! local hour in the report zone, fixed detection hours are scanned for the
//! rain keyword, per-location verdicts are OR-reduced, and the wall clock
//! (passed in by the caller) picks which message to surface.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::{
    error::ForecastError,
    model::{ForecastPayload, HourlyRecord, RainVerdict, Verdict},
};

/// Civil timezone all reports are expressed in (UTC+8).
pub const REPORT_ZONE: Tz = chrono_tz::Asia::Shanghai;

/// Substring of a weather description that signals rain.
pub const RAIN_KEYWORD: &str = "雨";

/// Forecast hours inspected for the morning report.
pub const MORNING_HOURS: [u32; 6] = [8, 9, 10, 11, 12, 13];

/// Forecast hours inspected for the afternoon report.
pub const AFTERNOON_HOURS: [u32; 5] = [14, 15, 16, 17, 18];

/// Wall-clock window in which morning rain is reported.
pub const MORNING_REPORT: TimeWindow = TimeWindow::from_hours(6, 9);
/// Wall-clock window in which afternoon rain is reported.
pub const AFTERNOON_REPORT: TimeWindow = TimeWindow::from_hours(12, 15);

/// Half-open wall-clock interval `[start, end)` on whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start_hour: u32,
    end_hour: u32,
}

impl TimeWindow {
    pub const fn from_hours(start_hour: u32, end_hour: u32) -> Self {
        Self { start_hour, end_hour }
    }

    pub fn contains(&self, at: NaiveTime) -> bool {
        (self.start_hour..self.end_hour).contains(&at.hour())
    }
}

/// A record placed in its local-hour slot.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketEntry {
    pub local_time: NaiveDateTime,
    pub record: HourlyRecord,
}

/// Local hour (0-23) to the last record seen for that hour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourBucket {
    slots: BTreeMap<u32, BucketEntry>,
}

impl HourBucket {
    /// Insert a record, replacing whatever was stored for the same hour.
    pub fn insert(&mut self, local_time: NaiveDateTime, record: HourlyRecord) {
        self.slots.insert(local_time.hour(), BucketEntry { local_time, record });
    }

    pub fn get(&self, hour: u32) -> Option<&BucketEntry> {
        self.slots.get(&hour)
    }

    pub fn hours(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Verdict for one location plus the records that had to be dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationEvaluation {
    pub verdict: RainVerdict,
    pub diagnostics: Vec<ForecastError>,
}

/// Bucket records by their hour of day in `tz`.
///
/// A record whose timestamp cannot be parsed is skipped and reported as a
/// [`ForecastError::MalformedTimestamp`] diagnostic.
pub fn bucket_by_local_hour<Z: TimeZone>(
    records: &[HourlyRecord],
    tz: &Z,
) -> (HourBucket, Vec<ForecastError>) {
    let mut bucket = HourBucket::default();
    let mut diagnostics = Vec::new();

    for record in records {
        match record.parse_time() {
            Ok(at) => bucket.insert(at.with_timezone(tz).naive_local(), record.clone()),
            Err(source) => diagnostics.push(ForecastError::MalformedTimestamp {
                fx_time: record.fx_time.clone(),
                source,
            }),
        }
    }

    (bucket, diagnostics)
}

/// True on the first listed hour whose description contains `keyword`.
///
/// Hours missing from the bucket count as "no rain".
pub fn detect_rain(bucket: &HourBucket, hours: &[u32], keyword: &str) -> bool {
    hours
        .iter()
        .any(|hour| bucket.get(*hour).is_some_and(|entry| entry.record.text.contains(keyword)))
}

pub fn evaluate_location(payload: &ForecastPayload) -> LocationEvaluation {
    let (bucket, diagnostics) = bucket_by_local_hour(&payload.hourly, &REPORT_ZONE);

    let verdict = RainVerdict {
        morning: detect_rain(&bucket, &MORNING_HOURS, RAIN_KEYWORD),
        afternoon: detect_rain(&bucket, &AFTERNOON_HOURS, RAIN_KEYWORD),
    };

    LocationEvaluation { verdict, diagnostics }
}

/// OR-reduce per-location verdicts. An empty input means no rain anywhere.
pub fn aggregate<I>(results: I) -> RainVerdict
where
    I: IntoIterator<Item = RainVerdict>,
{
    results.into_iter().fold(RainVerdict::default(), |acc, v| acc | v)
}

/// Pick the message for `now_local` (wall clock in [`REPORT_ZONE`]).
///
/// "No rain anywhere" wins at any time of day; the reporting windows only
/// gate messages about rain.
pub fn decide_message(aggregate: RainVerdict, now_local: NaiveTime) -> Verdict {
    if !aggregate.any() {
        Verdict::NoRain
    } else if MORNING_REPORT.contains(now_local) && aggregate.morning {
        Verdict::MorningRain
    } else if AFTERNOON_REPORT.contains(now_local) && aggregate.afternoon {
        Verdict::AfternoonRain
    } else {
        Verdict::OutsideReportingWindows
    }
}
