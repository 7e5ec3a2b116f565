use anyhow::{Context, Result};
use crate::core::RouteRecord;
use std::path::Path;

/// Parse a JSON array of `{latitude, longitude, timestamp}` records
pub fn parse_json(data: &[u8]) -> Result<Vec<RouteRecord>> {
    serde_json::from_slice(data).context("Invalid route JSON")
}

/// Load route records from a JSON file
pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<RouteRecord>> {
    let data = std::fs::read(path.as_ref())?;
    parse_json(&data)
}
