//! Flood map viewer session logic.
//!
//! Owns the state behind the dashboard map: which layers are on, which date
//! they show, the click queries fired against the active layers, the station
//! GeoJSON refresh and the chart CSV export.

pub mod click_query;
pub mod config;
pub mod http;
pub mod selection;
pub mod session;
pub mod stations;
pub mod timeseries;

pub use click_query::{ClickOutcome, ClickQueryClient, LayerFeatures};
pub use config::ViewerConfig;
pub use http::{HttpConfig, HttpFetcher};
pub use selection::{SelectionEvent, SelectionState};
pub use session::{LayerRequest, MapSession};
pub use stations::{FeatureCollection, StationLayer, StationPoller, StationSource};
pub use timeseries::{DischargeSeries, GeoSfmKind, GeoSfmSeries};
