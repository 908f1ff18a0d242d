use super::{approx_eq, at, day0};
use crate::time::{CycleClock, MILLIS_PER_DAY, MILLIS_PER_HOUR, parse_timestamp};
use crate::{ChartConfig, Error, EventRecord, PeriodicChart};
use std::f64::consts::TAU;

#[test]
fn angle_of_stays_in_one_turn() {
    let clock = CycleClock::new(MILLIS_PER_DAY).unwrap();
    let samples = [
        i64::MIN / 2,
        -MILLIS_PER_DAY - 1,
        -1,
        0,
        1,
        MILLIS_PER_DAY - 1,
        MILLIS_PER_DAY,
        at(0, 23, 59),
        at(400, 12, 0),
        i64::MAX / 2,
    ];
    for ts in samples {
        let a = clock.angle_of(ts);
        assert!((0.0..TAU).contains(&a), "angle_of({ts}) = {a}");
    }
}

#[test]
fn angle_of_for_negative_timestamps_counts_from_cycle_start() {
    let clock = CycleClock::new(MILLIS_PER_DAY).unwrap();
    // 18:00 on 1969-12-31.
    let a = clock.angle_of(-6 * MILLIS_PER_HOUR);
    assert!(approx_eq(a, 0.75 * TAU, 1e-12), "{a}");
}

#[test]
fn cycle_index_grows_across_whole_periods() {
    let clock = CycleClock::new(MILLIS_PER_DAY).unwrap().with_epoch(Some(day0()));
    let mut t1 = at(0, 0, 0) - 3 * MILLIS_PER_DAY;
    while t1 < at(10, 0, 0) {
        for gap in [MILLIS_PER_DAY, MILLIS_PER_DAY + 1, 3 * MILLIS_PER_DAY + 7] {
            let t2 = t1 + gap;
            assert!(
                clock.cycle_index_of(t2).unwrap() > clock.cycle_index_of(t1).unwrap(),
                "t1={t1} t2={t2}"
            );
        }
        t1 += 5 * MILLIS_PER_HOUR + 13;
    }
}

#[test]
fn cycle_index_requires_an_epoch() {
    let clock = CycleClock::new(MILLIS_PER_DAY).unwrap();
    let err = clock.cycle_index_of(at(0, 8, 0)).unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }), "{err}");

    let chart = PeriodicChart::new(ChartConfig::default()).unwrap();
    assert!(matches!(
        chart.cycle_index_of(at(0, 8, 0)),
        Err(Error::Configuration { .. })
    ));
}

#[test]
fn derived_epoch_is_the_start_of_the_earliest_cycle() {
    let clock = CycleClock::new(MILLIS_PER_DAY).unwrap();
    let epoch = clock.derive_epoch([at(2, 7, 0), at(1, 22, 15), at(3, 0, 0)]);
    assert_eq!(epoch, Some(at(1, 0, 0)));
    assert_eq!(clock.derive_epoch(std::iter::empty()), None);
}

#[test]
fn first_event_of_first_dataset_lands_on_cycle_zero() {
    let mut chart = PeriodicChart::new(ChartConfig::default()).unwrap();
    let records = [
        EventRecord::new(at(3, 21, 45), MILLIS_PER_HOUR),
        EventRecord::new(at(4, 2, 0), MILLIS_PER_HOUR),
    ];
    let conditioned = chart.condition(&records).unwrap();
    assert_eq!(conditioned[0].cycle_index, 0);
    assert_eq!(conditioned[1].cycle_index, 1);

    chart.render_dataset(&records, "#333").unwrap();
    assert_eq!(chart.epoch(), Some(at(3, 0, 0)));
    assert_eq!(chart.cycle_index_of(records[0].start).unwrap(), 0);
}

#[test]
fn scenario_morning_event_on_day_zero() {
    let chart = PeriodicChart::new(ChartConfig::default().with_epoch(day0())).unwrap();
    let start = at(0, 8, 0);
    assert!(approx_eq(chart.angle_of(start), 8.0 / 24.0 * TAU, 1e-12));
    assert!(approx_eq(chart.angle_of(start), 2.094, 1e-3));
    assert_eq!(chart.cycle_index_of(start).unwrap(), 0);
}

#[test]
fn parses_export_and_iso_timestamps() {
    assert_eq!(parse_timestamp("31/12/2015, 23:30"), Some(at(-1, 23, 30)));
    assert_eq!(parse_timestamp("1/1/2016, 8:05"), Some(at(0, 8, 5)));
    assert_eq!(parse_timestamp("2016-01-02 06:30"), Some(at(1, 6, 30)));
    assert_eq!(parse_timestamp("2016-01-02T06:30:00"), Some(at(1, 6, 30)));
    // The offset is dropped: wall-clock time is what lands on the wheel.
    assert_eq!(parse_timestamp("2016-01-02T06:30:00+11:00"), Some(at(1, 6, 30)));
    assert_eq!(parse_timestamp("2016-01-03"), Some(at(2, 0, 0)));
    assert_eq!(parse_timestamp("yesterday"), None);
}

#[test]
fn clock_rejects_non_positive_periods() {
    for period in [0, -MILLIS_PER_DAY] {
        assert!(matches!(
            CycleClock::new(period),
            Err(Error::InvalidConfig { field: "period", .. })
        ));
    }
}
