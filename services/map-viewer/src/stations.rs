//! Hydrological station GeoJSON loading and periodic refresh.
//!
//! The station layer is a static `FeatureCollection` asset that the backend
//! regenerates in place. Point features get `latitude`/`longitude`
//! properties copied from their geometry so popups and charts can read them
//! without touching the geometry.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use floodwatch_common::{FloodwatchError, FloodwatchResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::http::HttpFetcher;

/// Refresh period when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Where the station document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationSource {
    Url(String),
    File(PathBuf),
}

impl StationSource {
    /// Join `file` onto a base that is either an HTTP URL or a directory.
    pub fn from_base(base: &str, file: &str) -> Self {
        if base.starts_with("http://") || base.starts_with("https://") {
            StationSource::Url(format!("{}/{}", base.trim_end_matches('/'), file))
        } else {
            StationSource::File(PathBuf::from(base).join(file))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            StationSource::Url(url) => url.clone(),
            StationSource::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

impl Geometry {
    /// `(longitude, latitude)` of a Point geometry.
    pub fn point(&self) -> Option<(f64, f64)> {
        if self.kind != "Point" {
            return None;
        }
        let coords = self.coordinates.as_array()?;
        let lon = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        Some((lon, lat))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFeature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
}

/// GeoJSON allows `"properties": null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl GeoFeature {
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

fn feature_type() -> String {
    "Feature".to_string()
}

fn collection_type() -> String {
    "FeatureCollection".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<GeoFeature>,
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self {
            kind: collection_type(),
            features: Vec::new(),
        }
    }
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Find a station by its `station_name` property.
    pub fn station(&self, name: &str) -> Option<&GeoFeature> {
        self.features
            .iter()
            .find(|f| f.property_str("station_name") == Some(name))
    }
}

/// Copy Point coordinates into `latitude`/`longitude` properties.
///
/// Returns the number of features projected; other geometries are untouched.
pub fn project_coordinates(collection: &mut FeatureCollection) -> usize {
    let mut projected = 0;
    for feature in &mut collection.features {
        if let Some((lon, lat)) = feature.geometry.as_ref().and_then(Geometry::point) {
            feature.properties.insert("latitude".to_string(), Value::from(lat));
            feature.properties.insert("longitude".to_string(), Value::from(lon));
            projected += 1;
        }
    }
    projected
}

/// Parse a station document and project its coordinates.
pub fn parse_stations(body: &str) -> FloodwatchResult<FeatureCollection> {
    let mut collection: FeatureCollection = serde_json::from_str(body)?;
    if collection.kind != "FeatureCollection" {
        return Err(FloodwatchError::MalformedData(format!(
            "expected FeatureCollection, got {}",
            collection.kind
        )));
    }
    project_coordinates(&mut collection);
    Ok(collection)
}

/// Fetch and parse the station collection.
#[instrument(skip(fetcher, source), fields(source = %source.describe()))]
pub async fn load_stations(
    fetcher: &HttpFetcher,
    source: &StationSource,
) -> FloodwatchResult<FeatureCollection> {
    let body = match source {
        StationSource::Url(url) => fetcher.get_text_with_retry(url).await?,
        StationSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
            FloodwatchError::DataNotAvailable(format!("{}: {}", path.display(), e))
        })?,
    };

    let collection = parse_stations(&body)?;
    debug!(stations = collection.len(), "Loaded station collection");
    Ok(collection)
}

/// Background task refreshing the station collection on a fixed period.
///
/// Subscribers see the last good collection; a failed refresh keeps it.
pub struct StationPoller {
    receiver: watch::Receiver<Arc<FeatureCollection>>,
    shutdown: broadcast::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl StationPoller {
    /// Start polling. The first fetch happens immediately.
    pub fn spawn(fetcher: HttpFetcher, source: StationSource, period: Duration) -> Self {
        let period = if period.is_zero() {
            warn!("Zero station poll interval, using default");
            DEFAULT_POLL_INTERVAL
        } else {
            period
        };

        let (sender, receiver) = watch::channel(Arc::new(FeatureCollection::default()));
        let (shutdown, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(poll_loop(fetcher, source, period, sender, shutdown_rx));

        Self {
            receiver,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<FeatureCollection>> {
        self.receiver.clone()
    }

    pub fn latest(&self) -> Arc<FeatureCollection> {
        self.receiver.borrow().clone()
    }

    /// Cancel the interval and wait for the task to finish.
    pub async fn stop(mut self) {
        self.shutdown.send(()).ok();
        if let Some(handle) = self.handle.take() {
            handle.await.ok();
        }
    }
}

impl Drop for StationPoller {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// The station overlay: polling runs exactly while the layer is enabled.
pub struct StationLayer {
    fetcher: HttpFetcher,
    source: StationSource,
    period: Duration,
    poller: Option<StationPoller>,
}

impl StationLayer {
    pub fn new(fetcher: HttpFetcher, source: StationSource, period: Duration) -> Self {
        Self {
            fetcher,
            source,
            period,
            poller: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.poller.is_some()
    }

    /// Start polling if not already running. Returns a receiver for refreshes.
    pub fn enable(&mut self) -> watch::Receiver<Arc<FeatureCollection>> {
        let poller = self.poller.get_or_insert_with(|| {
            debug!(source = %self.source.describe(), "Station layer enabled");
            StationPoller::spawn(self.fetcher.clone(), self.source.clone(), self.period)
        });
        poller.subscribe()
    }

    /// Cancel polling. A no-op when already disabled.
    pub async fn disable(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop().await;
            debug!("Station layer disabled");
        }
    }

    /// Flip the layer, returning whether it is now enabled.
    pub async fn toggle(&mut self) -> bool {
        if self.is_enabled() {
            self.disable().await;
        } else {
            self.enable();
        }
        self.is_enabled()
    }

    /// Last published collection; empty while disabled.
    pub fn latest(&self) -> Arc<FeatureCollection> {
        self.poller
            .as_ref()
            .map(StationPoller::latest)
            .unwrap_or_default()
    }
}

async fn poll_loop(
    fetcher: HttpFetcher,
    source: StationSource,
    period: Duration,
    sender: watch::Sender<Arc<FeatureCollection>>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        source = %source.describe(),
        period_secs = period.as_secs_f64(),
        "Station polling started"
    );

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            _ = shutdown.recv() => break,
            result = load_stations(&fetcher, &source) => match result {
                Ok(collection) => {
                    sender.send_replace(Arc::new(collection));
                }
                Err(e) => {
                    warn!(error = %e, "Station refresh failed, keeping previous data");
                }
            }
        }
    }

    info!("Station polling stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_base() {
        assert_eq!(
            StationSource::from_base("https://example.org/static/data/", "stations.geojson"),
            StationSource::Url("https://example.org/static/data/stations.geojson".to_string())
        );
        assert_eq!(
            StationSource::from_base("public/data", "stations.geojson"),
            StationSource::File(PathBuf::from("public/data/stations.geojson"))
        );
    }

    #[test]
    fn test_projection_skips_non_points() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [39.6, -0.45]}, "properties": {"station_name": "Garissa"}},
                {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}, "properties": {}},
                {"type": "Feature", "geometry": null, "properties": {}}
            ]
        }"#;
        let collection = parse_stations(body).unwrap();
        let garissa = collection.station("Garissa").unwrap();
        assert_eq!(garissa.properties["latitude"], -0.45);
        assert_eq!(garissa.properties["longitude"], 39.6);
        assert!(!collection.features[1].properties.contains_key("latitude"));
        assert!(!collection.features[2].properties.contains_key("latitude"));
    }

    #[test]
    fn test_null_properties_are_empty() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [38.0, 2.0]}, "properties": {"station_name": "Isiolo"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [40.1, -1.2]}, "properties": null},
                {"type": "Feature", "geometry": null}
            ]
        }"#;
        let collection = parse_stations(body).unwrap();
        assert_eq!(collection.len(), 3);
        assert!(collection.station("Isiolo").is_some());

        let unnamed = &collection.features[1];
        assert_eq!(unnamed.properties.len(), 2);
        assert_eq!(unnamed.properties["latitude"], -1.2);
        assert_eq!(unnamed.properties["longitude"], 40.1);
        assert!(collection.features[2].properties.is_empty());
    }

    #[test]
    fn test_rejects_other_documents() {
        assert!(matches!(
            parse_stations(r#"{"type": "Feature", "properties": {}}"#),
            Err(FloodwatchError::MalformedData(_))
        ));
        assert!(parse_stations("not json").is_err());
    }
}
