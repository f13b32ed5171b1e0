//! Resolution of a layer descriptor and date into the WMS `LAYERS` value.
//!
//! Two date schemes exist side by side:
//! - Identifier substitution: hazard, impact and any other date-bearing family
//!   get `_YYYYMMDD` appended to the layer id.
//! - Runtime substitution: IBEW ids keep their `%date%` placeholder, and the
//!   date travels as `date`/`datetime` query parameters that the mapfile
//!   substitutes server-side.

use floodwatch_common::{LayerDescriptor, MapDate};
use tracing::warn;

/// Query parameter carrying the compact date for runtime substitution.
pub const DATE_PARAM: &str = "date";

/// Query parameter carrying the compact midnight timestamp.
pub const DATETIME_PARAM: &str = "datetime";

/// Resolve the `LAYERS` value for `layer` at `date`.
///
/// A date-bearing layer without a date degrades to its base id.
pub fn format_layer_id(layer: &LayerDescriptor, date: Option<MapDate>) -> String {
    if !layer.needs_date || layer.family.uses_runtime_substitution() {
        return layer.base_id.clone();
    }

    match date {
        Some(date) => format!("{}_{}", layer.base_id, date.compact()),
        None => {
            warn!(
                layer = %layer.base_id,
                family = %layer.family,
                "No active date for date-bearing layer, requesting undated id"
            );
            layer.base_id.clone()
        }
    }
}

/// Extra query parameters the layer's request must carry for `date`.
pub fn date_params(layer: &LayerDescriptor, date: Option<MapDate>) -> Vec<(&'static str, String)> {
    match date {
        Some(date) if layer.family.uses_runtime_substitution() => vec![
            (DATE_PARAM, date.compact()),
            (DATETIME_PARAM, date.compact_datetime()),
        ],
        _ => Vec::new(),
    }
}

/// Whether a request built for `layer` at `date` is actually scoped to a date.
pub fn is_date_scoped(layer: &LayerDescriptor, date: Option<MapDate>) -> bool {
    layer.needs_date && date.is_some()
}
