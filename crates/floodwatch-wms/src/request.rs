//! WMS request URL composition.
//!
//! Builds GetMap, GetFeatureInfo and GetLegendGraphic URLs for a layer at the
//! active date. Construction is pure; issuing the request is left to the map
//! renderer or the click-query client.

use floodwatch_common::{
    BoundingBox, FloodwatchError, FloodwatchResult, LayerDescriptor, MapDate,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::layer_id::{date_params, format_layer_id};

pub const WMS_VERSION: &str = "1.1.0";
pub const LEGEND_VERSION: &str = "1.0.0";
pub const SRS: &str = "EPSG:4326";
pub const IMAGE_FORMAT: &str = "image/png";
pub const INFO_FORMAT: &str = "text/plain";
pub const FEATURE_COUNT: u32 = 10;

/// The WMS services the viewer talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WmsEndpoints {
    /// Tiled cache in front of the renderer
    pub cached: String,
    /// Direct MapServer renderer (may carry its own `map=` parameter)
    pub direct: String,
    /// MapServer CGI base used for click queries
    pub mapserver: String,
    /// Mapfile holding the dated query layers
    pub mapfile: String,
}

impl Default for WmsEndpoints {
    fn default() -> Self {
        Self {
            cached: "http://localhost:8080/mapcache/wms".to_string(),
            direct: "http://localhost:8080/cgi-bin/mapserv?map=/etc/mapserver/floodwatch.map"
                .to_string(),
            mapserver: "http://localhost:8080/cgi-bin/mapserv".to_string(),
            mapfile: "/etc/mapserver/ibew_getfeatureinfo.map".to_string(),
        }
    }
}

impl WmsEndpoints {
    /// The GetMap endpoint for `layer`.
    pub fn for_layer(&self, layer: &LayerDescriptor) -> &str {
        if layer.use_cached_endpoint {
            &self.cached
        } else {
            &self.direct
        }
    }
}

/// WMS operations issued by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WmsOperation {
    GetMap,
    GetFeatureInfo,
    GetLegendGraphic,
}

impl WmsOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            WmsOperation::GetMap => "GetMap",
            WmsOperation::GetFeatureInfo => "GetFeatureInfo",
            WmsOperation::GetLegendGraphic => "GetLegendGraphic",
        }
    }
}

/// Pixel size and geographic extent of the current map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub bbox: BoundingBox,
    pub width: u32,
    pub height: u32,
}

impl ViewState {
    pub fn new(bbox: BoundingBox, width: u32, height: u32) -> Self {
        Self {
            bbox,
            width,
            height,
        }
    }

    pub fn validate(&self) -> FloodwatchResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FloodwatchError::InvalidParameter {
                param: "WIDTH/HEIGHT".to_string(),
                message: format!("view size {}x{} is empty", self.width, self.height),
            });
        }
        self.bbox.validate()
    }

    /// Container pixel of a geographic point, for clicks given as lon/lat.
    pub fn pixel_of(&self, lon: f64, lat: f64) -> ClickPoint {
        let x = (lon - self.bbox.west) / self.bbox.width() * self.width as f64;
        // Y is inverted (top=north, bottom=south)
        let y = (self.bbox.north - lat) / self.bbox.height() * self.height as f64;
        ClickPoint::new(x, y)
    }

    /// Geographic location of a container pixel, as (longitude, latitude).
    pub fn location_of(&self, point: ClickPoint) -> (f64, f64) {
        let lon = self.bbox.west + point.x / self.width as f64 * self.bbox.width();
        let lat = self.bbox.north - point.y / self.height as f64 * self.bbox.height();
        (lon, lat)
    }
}

/// Click position in container pixels, 0-based from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickPoint {
    pub x: f64,
    pub y: f64,
}

impl ClickPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Pixel indices sent as X/Y, rounded to the nearest pixel.
    pub fn pixel(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }

    fn check_inside(&self, view: &ViewState) -> FloodwatchResult<()> {
        let inside = self.x.is_finite()
            && self.y.is_finite()
            && (0.0..=view.width as f64).contains(&self.x)
            && (0.0..=view.height as f64).contains(&self.y);
        if inside {
            Ok(())
        } else {
            Err(FloodwatchError::InvalidParameter {
                param: "X/Y".to_string(),
                message: format!(
                    "click ({}, {}) outside {}x{} view",
                    self.x, self.y, view.width, view.height
                ),
            })
        }
    }
}

/// A concrete request derived for one layer.
///
/// Recomputed whenever the date or the active layers change; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRequest {
    pub operation: WmsOperation,
    /// Base id of the layer the request was derived from
    pub layer_id: String,
    /// Resolved WMS `LAYERS` value
    pub layer_param: String,
    /// Full request URL, endpoint plus encoded query string
    pub url: String,
    /// Query parameters appended to the endpoint, in order
    params: Vec<(String, String)>,
}

impl ResolvedRequest {
    /// Decoded value of an appended query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// Ordered query builder over a base endpoint.
struct QueryBuilder {
    endpoint: Url,
    params: Vec<(String, String)>,
}

impl QueryBuilder {
    fn new(endpoint: &str) -> FloodwatchResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            FloodwatchError::ConfigError(format!("Invalid WMS endpoint '{}': {}", endpoint, e))
        })?;
        Ok(Self {
            endpoint,
            params: Vec::new(),
        })
    }

    fn push(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    fn extend(mut self, extra: Vec<(&'static str, String)>) -> Self {
        self.params
            .extend(extra.into_iter().map(|(k, v)| (k.to_string(), v)));
        self
    }

    fn finish(
        self,
        operation: WmsOperation,
        layer: &LayerDescriptor,
        layer_param: String,
    ) -> ResolvedRequest {
        let mut url = self.endpoint;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in &self.params {
                query.append_pair(key, value);
            }
        }

        ResolvedRequest {
            operation,
            layer_id: layer.base_id.clone(),
            layer_param,
            url: url.to_string(),
            params: self.params,
        }
    }
}

/// Build the GetMap request for `layer` at `date`.
///
/// BBOX, WIDTH and HEIGHT are left to the tile renderer.
pub fn get_map(
    layer: &LayerDescriptor,
    date: Option<MapDate>,
    endpoints: &WmsEndpoints,
) -> FloodwatchResult<ResolvedRequest> {
    let layer_param = format_layer_id(layer, date);

    let request = QueryBuilder::new(endpoints.for_layer(layer))?
        .push("SERVICE", "WMS")
        .push("VERSION", WMS_VERSION)
        .push("REQUEST", WmsOperation::GetMap.as_str())
        .push("LAYERS", layer_param.as_str())
        .push("STYLES", "")
        .push("FORMAT", IMAGE_FORMAT)
        .push("TRANSPARENT", "true")
        .push("SRS", SRS)
        .extend(date_params(layer, date))
        .finish(WmsOperation::GetMap, layer, layer_param);

    Ok(request)
}

/// Build the GetFeatureInfo request for a click on the map.
pub fn get_feature_info(
    layer: &LayerDescriptor,
    date: Option<MapDate>,
    endpoints: &WmsEndpoints,
    view: &ViewState,
    click: ClickPoint,
) -> FloodwatchResult<ResolvedRequest> {
    view.validate()?;
    click.check_inside(view)?;

    let layer_param = format_layer_id(layer, date);
    let (x, y) = click.pixel();

    let request = QueryBuilder::new(&endpoints.mapserver)?
        .push("map", endpoints.mapfile.as_str())
        .push("SERVICE", "WMS")
        .push("VERSION", WMS_VERSION)
        .push("REQUEST", WmsOperation::GetFeatureInfo.as_str())
        .push("QUERY_LAYERS", layer_param.as_str())
        .push("LAYERS", layer_param.as_str())
        .push("INFO_FORMAT", INFO_FORMAT)
        .push("X", x.to_string())
        .push("Y", y.to_string())
        .push("WIDTH", view.width.to_string())
        .push("HEIGHT", view.height.to_string())
        .push("BBOX", view.bbox.to_wms_string())
        .push("SRS", SRS)
        .push("FEATURE_COUNT", FEATURE_COUNT.to_string())
        .extend(date_params(layer, date))
        .finish(WmsOperation::GetFeatureInfo, layer, layer_param);

    Ok(request)
}

/// Build the legend image request shown beside an active layer.
pub fn legend_graphic(
    layer: &LayerDescriptor,
    date: Option<MapDate>,
    endpoints: &WmsEndpoints,
) -> FloodwatchResult<ResolvedRequest> {
    let layer_param = format_layer_id(layer, date);

    let request = QueryBuilder::new(endpoints.for_layer(layer))?
        .push("SERVICE", "WMS")
        .push("REQUEST", WmsOperation::GetLegendGraphic.as_str())
        .push("VERSION", LEGEND_VERSION)
        .push("FORMAT", IMAGE_FORMAT)
        .push("LAYER", layer_param.as_str())
        .extend(date_params(layer, date))
        .finish(WmsOperation::GetLegendGraphic, layer, layer_param);

    Ok(request)
}
