//! Generators for synthetic station and click-query data.
//!
//! The generated values follow simple formulas so tests can assert on them
//! without hard-coding every sample.

use serde_json::{json, Value};

/// Builds a MapServer text/plain GetFeatureInfo body from attribute lists.
///
/// # Example
///
/// ```
/// use test_utils::feature_info_body;
///
/// let body = feature_info_body("rivers", &[&[("name", "Tana")]]);
/// assert!(body.contains("Feature 0:"));
/// assert!(body.contains("name = 'Tana'"));
/// ```
pub fn feature_info_body(layer: &str, features: &[&[(&str, &str)]]) -> String {
    let mut body = format!("GetFeatureInfo results:\n\nLayer '{}'\n", layer);
    for (i, attributes) in features.iter().enumerate() {
        body.push_str(&format!("  Feature {}: \n", i));
        for (key, value) in attributes.iter() {
            body.push_str(&format!("    {} = '{}'\n", key, value));
        }
    }
    body
}

/// Creates a station `FeatureCollection` with `count` point features.
///
/// Station `i` sits at longitude `35.0 + i`, latitude `i * 0.5`, and is
/// named `Station i`.
pub fn station_collection(count: usize) -> Value {
    let features: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [35.0 + i as f64, i as f64 * 0.5]
                },
                "properties": {
                    "station_name": format!("Station {}", i)
                }
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features
    })
}

/// Creates discharge properties with `samples` daily values.
///
/// Sample `i` is dated `2025-06-(10 + i)`; the GFS value is `100 + i * 10`
/// and the ICON value is `90 + i * 10`.
pub fn discharge_properties(samples: usize) -> Value {
    let times: Vec<String> = (0..samples)
        .map(|i| format!("2025-06-{:02} 00:00:00", 10 + i))
        .collect();
    let gfs: Vec<String> = (0..samples).map(|i| format!("{}", 100 + i * 10)).collect();
    let icon: Vec<String> = (0..samples).map(|i| format!("{}", 90 + i * 10)).collect();

    json!({
        "station_name": "Garissa",
        "time_period": times.join(","),
        "time_series_discharge_simulated-gfs": gfs.join(","),
        "time_series_discharge_simulated-icon": icon.join(",")
    })
}
