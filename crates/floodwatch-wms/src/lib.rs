//! WMS request composition and response parsing for the floodwatch map viewer.
//!
//! Supports:
//! - Resolving a layer descriptor and the selected date into a WMS `LAYERS` value
//! - Building GetMap, GetFeatureInfo and GetLegendGraphic URLs (WMS 1.1.0)
//! - Parsing MapServer text/plain GetFeatureInfo bodies
//! - Formatting parsed attributes for the click popup

pub mod getfeatureinfo;
pub mod layer_id;
pub mod popup;
pub mod request;

pub use getfeatureinfo::{classify_response, parse_feature_info, Feature, FeatureInfoBody};
pub use layer_id::{date_params, format_layer_id, is_date_scoped};
pub use popup::ImpactLevel;
pub use request::{ClickPoint, ResolvedRequest, ViewState, WmsEndpoints, WmsOperation};
