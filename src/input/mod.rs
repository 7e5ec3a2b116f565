pub mod csv;
pub mod json;
pub mod source;

pub use self::csv::{load_csv, parse_csv};
pub use json::{load_json, parse_json};
pub use source::{FileRouteSource, RouteSource, StaticRouteSource};

use anyhow::{Context, Result};
use crate::core::RouteRecord;
use std::path::Path;

/// Input format detection result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputFormat {
    Json,
    Csv,
    Unknown,
}

/// Detect the format of route data by looking at its first bytes
pub fn detect_format(data: &[u8]) -> InputFormat {
    if is_json(data) {
        return InputFormat::Json;
    }

    if is_csv(data) {
        return InputFormat::Csv;
    }

    InputFormat::Unknown
}

fn is_json(data: &[u8]) -> bool {
    // Route payloads are a top-level array of records
    data.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'[')
}

fn is_csv(data: &[u8]) -> bool {
    let sample = match std::str::from_utf8(&data[..data.len().min(500)]) {
        Ok(text) => text,
        Err(_) => return false,
    };

    // Header plus at least latitude, longitude, timestamp columns
    sample
        .lines()
        .next()
        .is_some_and(|header| header.chars().filter(|&c| c == ',').count() >= 2)
}

/// Parse route records from raw bytes, auto-detecting the format
pub fn parse_bytes(data: &[u8]) -> Result<Vec<RouteRecord>> {
    match detect_format(data) {
        InputFormat::Json => parse_json(data),
        InputFormat::Csv => parse_csv(data),
        InputFormat::Unknown => anyhow::bail!("Unknown route format"),
    }
}

/// Load route records from a file, auto-detecting the format
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<RouteRecord>> {
    let path = path.as_ref();
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read route file {}", path.display()))?;
    parse_bytes(&data).with_context(|| format!("Failed to parse route file {}", path.display()))
}
