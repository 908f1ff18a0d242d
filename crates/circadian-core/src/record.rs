use crate::time::{CycleClock, Timestamp};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// One input event: an absolute start plus a duration in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub start: Timestamp,
    pub duration: i64,
}

impl EventRecord {
    pub fn new(start: Timestamp, duration: i64) -> Self {
        Self { start, duration }
    }

    pub fn end(&self) -> Option<Timestamp> {
        self.start.checked_add(self.duration)
    }
}

/// An event mapped onto the wheel.
///
/// `start_angle` is negative only when the event crosses the cycle boundary; in every case
/// `end_angle - start_angle` is the short arc between the two instants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionedRecord {
    pub start_angle: f64,
    pub end_angle: f64,
    pub cycle_index: i64,
}

impl ConditionedRecord {
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    pub fn crosses_boundary(&self) -> bool {
        self.start_angle < 0.0
    }
}

/// Checks the parts of a record that do not depend on the epoch.
pub(crate) fn validate_record(index: usize, record: &EventRecord, period: i64) -> Result<()> {
    if record.duration < 0 {
        return Err(Error::Validation {
            index,
            field: "duration",
            message: format!("must not be negative, got {} ms", record.duration),
        });
    }
    if record.duration >= period {
        return Err(Error::Validation {
            index,
            field: "duration",
            message: format!(
                "must be shorter than one period ({period} ms), got {} ms",
                record.duration
            ),
        });
    }
    if record.end().is_none() {
        return Err(Error::Validation {
            index,
            field: "start",
            message: format!("start + duration overflows: {} + {}", record.start, record.duration),
        });
    }
    Ok(())
}

/// Maps one validated record onto the wheel of `clock`, which must already carry an epoch.
pub(crate) fn condition_record(
    clock: &CycleClock,
    index: usize,
    record: &EventRecord,
) -> Result<ConditionedRecord> {
    validate_record(index, record, clock.period())?;
    let end = record.start + record.duration;

    let mut start_angle = clock.angle_of(record.start);
    let end_angle = clock.angle_of(end);
    if start_angle > end_angle {
        start_angle -= TAU;
    }

    let cycle_index = clock.cycle_index_of(record.start)?;
    if cycle_index < 0 {
        return Err(Error::Validation {
            index,
            field: "start",
            message: format!(
                "starts {} cycle(s) before the chart epoch; pass an explicit epoch covering every dataset",
                -cycle_index
            ),
        });
    }

    Ok(ConditionedRecord {
        start_angle,
        end_angle,
        cycle_index,
    })
}
