use anyhow::{Context, Result};
use async_trait::async_trait;
use crate::core::{Route, RouteRecord};
use crate::input::parse_bytes;
use std::path::PathBuf;
use tracing::info;

/// Trait for anything that can supply a route payload
///
/// Implementations:
/// - files on disk (JSON or CSV)
/// - in-memory records for tests and embedding
#[async_trait]
pub trait RouteSource: Send + Sync {
    /// Human-readable description of where the route comes from
    fn describe(&self) -> String;

    /// Fetch the raw payload records
    async fn fetch(&self) -> Result<Vec<RouteRecord>>;

    /// Fetch and convert to a route; a malformed payload yields the empty route
    async fn load(&self) -> Result<Route> {
        let records = self.fetch().await?;
        let route = Route::from_records(&records);
        info!("Loaded {} samples from {}", route.len(), self.describe());
        Ok(route)
    }
}

/// Route file on the local filesystem
pub struct FileRouteSource {
    path: PathBuf,
}

impl FileRouteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RouteSource for FileRouteSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<RouteRecord>> {
        let data = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read route file {}", self.path.display()))?;
        parse_bytes(&data).with_context(|| format!("Failed to parse route file {}", self.path.display()))
    }
}

/// Records already held in memory
pub struct StaticRouteSource {
    records: Vec<RouteRecord>,
}

impl StaticRouteSource {
    pub fn new(records: Vec<RouteRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RouteSource for StaticRouteSource {
    fn describe(&self) -> String {
        format!("{} in-memory records", self.records.len())
    }

    async fn fetch(&self) -> Result<Vec<RouteRecord>> {
        Ok(self.records.clone())
    }
}
