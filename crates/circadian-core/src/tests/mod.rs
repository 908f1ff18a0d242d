mod transform;

use crate::time::{MILLIS_PER_DAY, MILLIS_PER_HOUR, MILLIS_PER_MINUTE, Timestamp};
use chrono::NaiveDate;

/// 2016-01-01T00:00 as wall-clock milliseconds.
pub(super) fn day0() -> Timestamp {
    let naive = NaiveDate::from_ymd_opt(2016, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    crate::time::timestamp_from_naive(naive)
}

pub(super) fn at(day: i64, hour: i64, minute: i64) -> Timestamp {
    day0() + day * MILLIS_PER_DAY + hour * MILLIS_PER_HOUR + minute * MILLIS_PER_MINUTE
}

pub(super) fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}
