use anyhow::{Context, Result};
use crate::core::RouteRecord;
use std::io::Read;
use std::path::Path;

/// Load route records from a CSV file
///
/// Supports flexible column names:
/// - latitude / lat
/// - longitude / lng / lon
/// - timestamp / time / ts
///
/// Timestamps are epoch milliseconds. Fractional values are truncated.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<RouteRecord>> {
    let rdr = csv::Reader::from_path(path.as_ref())?;
    read_records(rdr)
}

/// Parse route records from CSV bytes
pub fn parse_csv(data: &[u8]) -> Result<Vec<RouteRecord>> {
    read_records(csv::Reader::from_reader(data))
}

fn read_records<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<RouteRecord>> {
    let headers = rdr.headers()?;
    let (lat_idx, lng_idx, time_idx) = detect_columns(headers)?;

    let mut records = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result.context("Failed to read CSV row")?;

        let latitude = parse_field::<f64>(&record, lat_idx)
            .with_context(|| format!("Bad latitude in row {}", row + 1))?;
        let longitude = parse_field::<f64>(&record, lng_idx)
            .with_context(|| format!("Bad longitude in row {}", row + 1))?;
        let timestamp = parse_field::<i64>(&record, time_idx)
            .or_else(|| {
                parse_field::<f64>(&record, time_idx)
                    .filter(|t| t.is_finite())
                    .map(|t| t as i64)
            })
            .with_context(|| format!("Bad timestamp in row {}", row + 1))?;

        records.push(RouteRecord { latitude, longitude, timestamp });
    }

    Ok(records)
}

fn parse_field<T: std::str::FromStr>(record: &csv::StringRecord, idx: usize) -> Option<T> {
    record.get(idx).and_then(|s| s.trim().parse::<T>().ok())
}

/// Detect column indices from CSV headers
fn detect_columns(headers: &csv::StringRecord) -> Result<(usize, usize, usize)> {
    let lat_idx = find_column(headers, &["latitude", "lat"])?;
    let lng_idx = find_column(headers, &["longitude", "lng", "lon"])?;
    let time_idx = find_column(headers, &["timestamp", "time", "ts"])?;

    Ok((lat_idx, lng_idx, time_idx))
}

/// Find a column by checking possible names
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Result<usize> {
    for (idx, header) in headers.iter().enumerate() {
        let header_lower = header.trim().to_lowercase();
        if names.iter().any(|&name| header_lower == name) {
            return Ok(idx);
        }
    }

    anyhow::bail!("Could not find column with names: {:?}", names)
}
