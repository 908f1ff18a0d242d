//! CSV exports → [`EventRecord`]s.

use circadian_core::EventRecord;
use circadian_core::time::{MILLIS_PER_MINUTE, Timestamp, parse_timestamp};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Nursing sessions shorter than this are stretched so they stay visible on the inner rings.
const NURSING_MIN_DURATION: i64 = 10 * MILLIS_PER_MINUTE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapping {
    /// `Time`, `Duration(minutes)`
    Sleep,
    /// `Time`, `Left duration`, `Right duration` (minutes)
    Nursing,
    /// `start`, `duration` (minutes)
    Events,
}

impl Mapping {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sleep => "sleep",
            Self::Nursing => "nursing",
            Self::Events => "events",
        }
    }

    pub fn default_color(self) -> &'static str {
        match self {
            Self::Sleep => "#333",
            Self::Nursing => "#F33",
            Self::Events => "#36C",
        }
    }
}

impl FromStr for Mapping {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sleep" => Ok(Self::Sleep),
            "nursing" | "feeding" => Ok(Self::Nursing),
            "events" => Ok(Self::Events),
            _ => Err(()),
        }
    }
}

#[derive(Debug)]
pub enum SourceError {
    Csv(csv::Error),
    MissingColumn {
        column: &'static str,
    },
    Row {
        /// 1-based line in the file, header included.
        line: u64,
        message: String,
    },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Csv(err) => write!(f, "CSV error: {err}"),
            SourceError::MissingColumn { column } => write!(f, "missing CSV column `{column}`"),
            SourceError::Row { line, message } => write!(f, "line {line}: {message}"),
        }
    }
}

impl From<csv::Error> for SourceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

pub fn load_records(path: &Path, mapping: Mapping) -> Result<Vec<EventRecord>, SourceError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    read_records(file, mapping)
}

pub fn read_records<R: Read>(reader: R, mapping: Mapping) -> Result<Vec<EventRecord>, SourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(SourceError::MissingColumn { column: name })
    };
    let columns = match mapping {
        Mapping::Sleep => vec![column("Time")?, column("Duration(minutes)")?],
        Mapping::Nursing => vec![
            column("Time")?,
            column("Left duration")?,
            column("Right duration")?,
        ],
        Mapping::Events => vec![column("start")?, column("duration")?],
    };

    let mut out = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(i as u64 + 2);
        let fields: Vec<&str> = columns.iter().map(|&c| row.get(c).unwrap_or("")).collect();
        let record =
            map_row(mapping, &fields).map_err(|message| SourceError::Row { line, message })?;
        out.push(record);
    }
    tracing::debug!(mapping = mapping.name(), records = out.len(), "loaded CSV source");
    Ok(out)
}

/// `fields` are the mapping's columns, in the order listed on [`Mapping`].
fn map_row(mapping: Mapping, fields: &[&str]) -> Result<EventRecord, String> {
    let field = |idx: usize| fields.get(idx).copied().unwrap_or("");
    let start = parse_start(field(0))?;
    let duration = match mapping {
        Mapping::Sleep | Mapping::Events => minutes_to_millis(field(1))?,
        Mapping::Nursing => {
            let total = minutes_to_millis(field(1))?.saturating_add(minutes_to_millis(field(2))?);
            total.max(NURSING_MIN_DURATION)
        }
    };
    Ok(EventRecord::new(start, duration))
}

fn parse_start(text: &str) -> Result<Timestamp, String> {
    parse_timestamp(text)
        .or_else(|| text.trim().parse::<i64>().ok())
        .ok_or_else(|| format!("unrecognised timestamp `{text}`"))
}

/// Blank cells count as zero minutes.
fn minutes_to_millis(text: &str) -> Result<i64, String> {
    let t = text.trim();
    if t.is_empty() {
        return Ok(0);
    }
    let minutes = t
        .parse::<f64>()
        .map_err(|_| format!("invalid duration `{t}`"))?;
    if !(minutes.is_finite() && minutes >= 0.0) {
        return Err(format!("duration must be a non-negative number of minutes, got `{t}`"));
    }
    let ms = (minutes * MILLIS_PER_MINUTE as f64).round();
    if ms > i64::MAX as f64 {
        return Err(format!("duration `{t}` is out of range"));
    }
    Ok(ms as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use circadian_core::time::MILLIS_PER_HOUR;

    fn ts(text: &str) -> Timestamp {
        parse_timestamp(text).unwrap()
    }

    #[test]
    fn sleep_rows_map_time_and_minutes() {
        let csv = "Time,Duration(minutes)\n\"31/12/2015, 23:30\",90\n\"1/1/2016, 09:05\",45.5\n";
        let records = read_records(csv.as_bytes(), Mapping::Sleep).unwrap();
        assert_eq!(
            records,
            vec![
                EventRecord::new(ts("2015-12-31 23:30"), 90 * MILLIS_PER_MINUTE),
                EventRecord::new(ts("2016-01-01 09:05"), 45 * MILLIS_PER_MINUTE + 30_000),
            ]
        );
    }

    #[test]
    fn nursing_sums_both_sides_and_stretches_short_sessions() {
        let csv = "Time,Left duration,Right duration\n\
\"1/1/2016, 02:00\",12,8\n\
\"1/1/2016, 05:00\",3,\n";
        let records = read_records(csv.as_bytes(), Mapping::Nursing).unwrap();
        assert_eq!(records[0].duration, 20 * MILLIS_PER_MINUTE);
        assert_eq!(records[1].duration, NURSING_MIN_DURATION);
        assert_eq!(records[1].start, ts("2016-01-01 05:00"));
    }

    #[test]
    fn generic_events_accept_iso_timestamps() {
        let csv = "start,duration\n2016-01-01T22:00:00,240\n";
        let records = read_records(csv.as_bytes(), Mapping::Events).unwrap();
        assert_eq!(records[0].duration, 4 * MILLIS_PER_HOUR);
    }

    #[test]
    fn first_bad_row_reports_its_line() {
        let csv = "Time,Duration(minutes)\n\"1/1/2016, 09:00\",30\n\"yesterday\",30\n";
        let err = read_records(csv.as_bytes(), Mapping::Sleep).unwrap_err();
        match err {
            SourceError::Row { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("yesterday"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_minutes_are_rejected() {
        let csv = "start,duration\n2016-01-01 10:00,-5\n";
        let err = read_records(csv.as_bytes(), Mapping::Events).unwrap_err();
        assert!(matches!(err, SourceError::Row { line: 2, .. }), "{err}");
    }

    #[test]
    fn missing_column_is_named() {
        let csv = "Time,Minutes\n\"1/1/2016, 09:00\",30\n";
        let err = read_records(csv.as_bytes(), Mapping::Sleep).unwrap_err();
        assert_eq!(err.to_string(), "missing CSV column `Duration(minutes)`");
    }

    #[test]
    fn mapping_names_parse() {
        assert_eq!("Sleep".parse::<Mapping>(), Ok(Mapping::Sleep));
        assert_eq!("feeding".parse::<Mapping>(), Ok(Mapping::Nursing));
        assert!("naps".parse::<Mapping>().is_err());
    }
}
