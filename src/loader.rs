use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use csv::StringRecord;
use thiserror::Error;

use crate::data::Bar;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("input file contains no valid rows")]
    Empty,

    #[error("unable to infer timestamp from record: {0:?}")]
    Timestamp(StringRecord),

    #[error("failed to parse numeric field '{field}' from value '{value}'")]
    ParseNumber { field: &'static str, value: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    #[error("series contains no bars")]
    Empty,

    #[error("timestamps must be strictly increasing (bar {index})")]
    NonMonotonic { index: usize },

    #[error("bar {index} violates the open/high/low/close ordering")]
    MalformedBar { index: usize },
}

/// Load `timestamp, open, high, low, close[, volume]` rows, localised to `tz` and sorted
/// ascending by time.
pub fn load_bars_from_csv<P: AsRef<Path>>(path: P, tz: Tz) -> Result<Vec<Bar>> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref).with_context(|| format!("failed to open {:?}", path_ref))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let mut bars = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if let Some(bar) = parse_record(&record, tz)? {
            bars.push(bar);
        }
    }

    if bars.is_empty() {
        return Err(LoaderError::Empty.into());
    }

    bars.sort_by_key(|bar| bar.timestamp);
    Ok(bars)
}

fn parse_record(record: &StringRecord, tz: Tz) -> Result<Option<Bar>> {
    // Header rows name the time column.
    if let Some(first) = record.get(0) {
        let first = first.trim();
        if ["time", "timestamp", "date"]
            .iter()
            .any(|name| first.eq_ignore_ascii_case(name))
        {
            return Ok(None);
        }
    }

    let fields: Vec<String> = record
        .iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    if fields.len() < 5 {
        return Ok(None);
    }

    let (timestamp, offset) = if let Some(ts) = parse_epoch_millis(&fields[0], tz) {
        (ts, 1)
    } else if let Some(naive) = parse_datetime_string(&fields[0]) {
        (localize(naive, tz), 1)
    } else if fields.len() >= 6 {
        (localize(parse_datetime_pair(&fields[0], &fields[1])?, tz), 2)
    } else {
        return Err(anyhow!(LoaderError::Timestamp(record.clone())));
    };

    let open = parse_number(fields.get(offset).map(String::as_str), "open")?;
    let high = parse_number(fields.get(offset + 1).map(String::as_str), "high")?;
    let low = parse_number(fields.get(offset + 2).map(String::as_str), "low")?;
    let close = parse_number(fields.get(offset + 3).map(String::as_str), "close")?;
    let volume = match fields.get(offset + 4) {
        Some(value) => parse_number(Some(value.as_str()), "volume")?,
        None => 0.0,
    };

    Ok(Some(Bar {
        timestamp,
        open,
        high,
        low,
        close,
        volume,
    }))
}

fn localize(datetime: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(&datetime) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(dt, _) => dt,
        chrono::LocalResult::None => tz.from_utc_datetime(&datetime),
    }
}

/// Exchange klines carry open time as epoch milliseconds. Anything shorter than 13
/// digits predates 2001-09-09 and is more likely epoch seconds, so it is not accepted.
fn parse_epoch_millis(value: &str, tz: Tz) -> Option<DateTime<Tz>> {
    if value.len() < 13 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis = value.parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|utc| utc.with_timezone(&tz))
}

fn parse_number(value: Option<&str>, field: &'static str) -> Result<f64> {
    let value = value.ok_or_else(|| LoaderError::ParseNumber {
        field,
        value: String::from("<missing>"),
    })?;
    value
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| LoaderError::ParseNumber {
            field,
            value: value.to_string(),
        })
        .map_err(anyhow::Error::from)
}

fn parse_datetime_pair(date_str: &str, time_str: &str) -> Result<NaiveDateTime> {
    let date = parse_date(date_str)?;
    let time = parse_time(time_str)?;
    Ok(NaiveDateTime::new(date, time))
}

fn parse_datetime_string(value: &str) -> Option<NaiveDateTime> {
    let patterns = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    patterns
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(value, pattern).ok())
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    let patterns = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    patterns
        .iter()
        .find_map(|pattern| NaiveDate::parse_from_str(value, pattern).ok())
        .ok_or_else(|| LoaderError::Timestamp(StringRecord::from(vec![value.to_string()])).into())
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    let patterns = ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];
    patterns
        .iter()
        .find_map(|pattern| NaiveTime::parse_from_str(value, pattern).ok())
        .ok_or_else(|| LoaderError::Timestamp(StringRecord::from(vec![value.to_string()])).into())
}

/// Keep only the most recent `limit` bars.
pub fn tail_window(mut bars: Vec<Bar>, limit: usize) -> Vec<Bar> {
    if bars.len() > limit {
        bars.drain(..bars.len() - limit);
    }
    bars
}

/// Reject series the swing core cannot take as-is.
pub fn validate_series(bars: &[Bar]) -> Result<(), SeriesError> {
    if bars.is_empty() {
        return Err(SeriesError::Empty);
    }

    if let Some(index) = bars.iter().position(|bar| !bar.is_well_formed()) {
        return Err(SeriesError::MalformedBar { index });
    }

    if let Some(offset) = bars
        .windows(2)
        .position(|pair| pair[1].timestamp <= pair[0].timestamp)
    {
        return Err(SeriesError::NonMonotonic { index: offset + 1 });
    }

    Ok(())
}
