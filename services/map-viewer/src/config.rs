//! Configuration loading for the map viewer.
//!
//! Loads endpoints, the layer catalog location, station polling and HTTP
//! settings from a YAML file. Every section is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use floodwatch_common::LayerCatalog;
use floodwatch_wms::WmsEndpoints;
use serde::Deserialize;
use tracing::{debug, info};

use crate::http::HttpConfig;
use crate::stations::StationSource;

/// Environment variable selecting the production asset paths.
pub const PRODUCTION_ENV: &str = "FLOODWATCH_PRODUCTION";

/// Root configuration loaded from the viewer YAML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub endpoints: WmsEndpoints,
    /// Layer catalog YAML; the built-in catalog when absent
    pub catalog: Option<PathBuf>,
    pub stations: StationsConfig,
    pub http: HttpConfig,
    /// Layers toggled on at startup in addition to the protected boundaries
    pub initial_layers: Vec<String>,
}

/// Station GeoJSON location and refresh period.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StationsConfig {
    /// Asset base during development (directory or URL)
    pub dev_base: String,
    /// Asset base in production builds
    pub production_base: String,
    pub file: String,
    pub poll_interval_secs: u64,
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            dev_base: "public/data".to_string(),
            production_base: "/static/data".to_string(),
            file: "stations.geojson".to_string(),
            poll_interval_secs: 60,
        }
    }
}

impl StationsConfig {
    pub fn source(&self, production: bool) -> StationSource {
        let base = if production {
            &self.production_base
        } else {
            &self.dev_base
        };
        StationSource::from_base(base, &self.file)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl ViewerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse viewer config")
    }

    /// Load the configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ViewerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "Loaded viewer config");
        Ok(config)
    }

    /// The configured catalog, or the built-in one.
    pub fn load_catalog(&self) -> Result<LayerCatalog> {
        match &self.catalog {
            Some(path) => LayerCatalog::load(path)
                .with_context(|| format!("Failed to load layer catalog: {}", path.display())),
            None => {
                info!("Using built-in layer catalog");
                Ok(LayerCatalog::builtin())
            }
        }
    }
}

/// Whether `FLOODWATCH_PRODUCTION` asks for the production asset paths.
pub fn production_flag() -> bool {
    std::env::var(PRODUCTION_ENV)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
