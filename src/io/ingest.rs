//! CSV ingest for the OWID COVID-19 feed.
//!
//! The feed is one large CSV with ~60 columns and one row per (location, date).
//! Rows are grouped by location, so once we have walked past the target
//! location there is nothing left to read and we stop pulling from the stream.
//!
//! Only eight columns matter here; the rest are ignored.

use std::collections::HashMap;
use std::io::Read;

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;

use crate::domain::{FeedFilter, StatisticRecord};
use crate::error::AppError;

const COL_LOCATION: &str = "location";
const COL_DATE: &str = "date";
const COL_NEW_CASES: &str = "new_cases";
const COL_NEW_DEATHS: &str = "new_deaths";
const COL_NEW_VACCINATIONS: &str = "new_vaccinations";
const COL_TOTAL_CASES: &str = "total_cases";
const COL_TOTAL_DEATHS: &str = "total_deaths";
const COL_TOTAL_VACCINATIONS: &str = "total_vaccinations";

const REQUIRED_COLUMNS: [&str; 8] = [
    COL_LOCATION,
    COL_DATE,
    COL_NEW_CASES,
    COL_NEW_DEATHS,
    COL_NEW_VACCINATIONS,
    COL_TOTAL_CASES,
    COL_TOTAL_DEATHS,
    COL_TOTAL_VACCINATIONS,
];

/// Result of ingesting one feed stream.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    /// Matching records, in stream order.
    pub records: Vec<StatisticRecord>,
    /// Data rows pulled from the stream (including the one that stopped it).
    pub rows_read: usize,
    /// Target-location rows dropped for being outside the year or undated.
    pub rows_skipped: usize,
    /// `true` when parsing stopped at the first row after the target block.
    pub stopped_early: bool,
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    location: usize,
    date: usize,
    new_cases: usize,
    new_deaths: usize,
    new_vaccinations: usize,
    total_cases: usize,
    total_deaths: usize,
    total_vaccinations: usize,
}

/// Stream-parse the feed, keeping rows for `filter.location` in `filter.year`.
pub fn ingest_feed<R: Read>(source: R, filter: &FeedFilter) -> Result<IngestOutcome, AppError> {
    // `flexible` lets a truncated final row through; its missing cells read as blank.
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::feed(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let columns = resolve_columns(&build_header_map(&headers))?;

    let mut outcome = IngestOutcome::default();
    let mut seen_target = false;
    let mut record = StringRecord::new();

    loop {
        let more = reader.read_record(&mut record).map_err(|e| {
            AppError::feed(format!(
                "CSV read failed after {} row(s): {e}",
                outcome.rows_read
            ))
        })?;
        if !more {
            break;
        }
        outcome.rows_read += 1;

        let location = record.get(columns.location).unwrap_or("");
        if location != filter.location {
            if seen_target {
                outcome.stopped_early = true;
                break;
            }
            continue;
        }
        seen_target = true;

        let date = match record.get(columns.date).and_then(parse_date) {
            Some(d) if d.year() == filter.year => d,
            _ => {
                outcome.rows_skipped += 1;
                continue;
            }
        };

        outcome.records.push(StatisticRecord {
            date,
            new_confirmed: parse_count(record.get(columns.new_cases)),
            new_deaths: parse_count(record.get(columns.new_deaths)),
            new_vaccinations: parse_count(record.get(columns.new_vaccinations)),
            total_confirmed: parse_count(record.get(columns.total_cases)),
            total_deaths: parse_count(record.get(columns.total_deaths)),
            total_vaccinations: parse_count(record.get(columns.total_vaccinations)),
        });
    }

    Ok(outcome)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Strip a UTF-8 BOM from the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> Result<Columns, AppError> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| !header_map.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::feed(format!(
            "Feed is missing required column(s): {}",
            missing.join(", ")
        )));
    }

    let idx = |name: &str| header_map[name];
    Ok(Columns {
        location: idx(COL_LOCATION),
        date: idx(COL_DATE),
        new_cases: idx(COL_NEW_CASES),
        new_deaths: idx(COL_NEW_DEATHS),
        new_vaccinations: idx(COL_NEW_VACCINATIONS),
        total_cases: idx(COL_TOTAL_CASES),
        total_deaths: idx(COL_TOTAL_DEATHS),
        total_vaccinations: idx(COL_TOTAL_VACCINATIONS),
    })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Read a count cell. Blank, negative, non-finite or unreadable values become 0.
///
/// OWID writes counts as floats (`"1234.0"`), so integral parsing falls back to
/// `f64` and truncates.
pub fn parse_count(raw: Option<&str>) -> u64 {
    let trimmed = raw.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return 0;
    }
    if let Ok(v) = trimmed.parse::<u64>() {
        return v;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v.trunc() as u64,
        _ => 0,
    }
}
