//! Periodic time coordinates.
//!
//! Timestamps are wall-clock milliseconds since `1970-01-01T00:00:00` (no timezone applied), so a
//! local midnight always lands on angle `0` of a 24 hour cycle. Durations are plain milliseconds.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::f64::consts::TAU;

pub type Timestamp = i64;

pub const MILLIS_PER_MINUTE: i64 = 60 * 1000;
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

pub fn timestamp_from_naive(naive: NaiveDateTime) -> Timestamp {
    naive.and_utc().timestamp_millis()
}

/// Uses the wall-clock reading of `dt` in its own timezone, dropping the offset.
pub fn timestamp_from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Timestamp {
    timestamp_from_naive(dt.naive_local())
}

pub fn naive_from_timestamp(ts: Timestamp) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp_millis(ts).map(|dt| dt.naive_utc())
}

const NAIVE_FORMATS: &[&str] = &[
    // Export format of the baby-tracker CSVs: `31/12/2015, 23:30`.
    "%d/%m/%Y, %H:%M",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses the timestamp spellings accepted in data files and configs.
///
/// RFC 3339 inputs keep their wall-clock reading; the offset is discarded.
pub fn parse_timestamp(text: &str) -> Option<Timestamp> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(timestamp_from_naive(naive));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(timestamp_from_datetime(&dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Some(timestamp_from_naive(date.and_hms_opt(0, 0, 0)?));
    }
    None
}

/// Maps absolute timestamps onto `(angle, cycle index)` for a fixed period.
///
/// The epoch is optional until the first dataset is laid out; after that it is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleClock {
    period: i64,
    epoch: Option<Timestamp>,
}

impl CycleClock {
    pub fn new(period: i64) -> Result<Self> {
        if period <= 0 {
            return Err(Error::InvalidConfig {
                field: "period",
                message: format!("must be positive, got {period}"),
            });
        }
        Ok(Self {
            period,
            epoch: None,
        })
    }

    pub fn with_epoch(mut self, epoch: Option<Timestamp>) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn period(&self) -> i64 {
        self.period
    }

    pub fn epoch(&self) -> Option<Timestamp> {
        self.epoch
    }

    /// Angle within the cycle, clockwise from the cycle start, in `[0, 2π)`.
    pub fn angle_of(&self, ts: Timestamp) -> f64 {
        let offset = ts.rem_euclid(self.period);
        let angle = (offset as f64 / self.period as f64) * TAU;
        // f64 rounding can reach TAU on periods wider than 2^53 ms.
        if angle >= TAU { 0.0 } else { angle }
    }

    /// Absolute cycle number, counted from the Unix epoch.
    pub fn cycle_of(&self, ts: Timestamp) -> i64 {
        ts.div_euclid(self.period)
    }

    pub fn cycle_index_of(&self, ts: Timestamp) -> Result<i64> {
        let Some(epoch) = self.epoch else {
            return Err(Error::Configuration {
                message: "cycle index requested before the epoch was established".to_string(),
            });
        };
        Ok(self.cycle_of(ts) - self.cycle_of(epoch))
    }

    /// Start of the cycle containing the earliest of `starts`.
    pub fn derive_epoch(&self, starts: impl IntoIterator<Item = Timestamp>) -> Option<Timestamp> {
        let min = starts.into_iter().min()?;
        Some(self.cycle_of(min) * self.period)
    }

    pub(crate) fn freeze_epoch(&mut self, epoch: Timestamp) {
        if self.epoch.is_none() {
            self.epoch = Some(epoch);
        }
    }
}
