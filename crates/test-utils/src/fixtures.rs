//! Common test fixtures for floodwatch tests.
//!
//! Canned documents in the shapes the external collaborators actually
//! produce: MapServer text/plain GetFeatureInfo bodies, catalog YAML and
//! viewer configuration.

/// Common view extents as `(west, south, east, north)`.
pub mod bbox {
    /// Greater Horn of Africa, the dashboard's initial view
    pub const EAST_AFRICA: (f64, f64, f64, f64) = (21.8, -4.7, 51.4, 23.0);

    /// Kenya
    pub const KENYA: (f64, f64, f64, f64) = (33.9, -4.7, 41.9, 5.0);

    /// Inverted box (west > east)
    pub const INVERTED: (f64, f64, f64, f64) = (41.9, -4.7, 33.9, 5.0);
}

/// Minimal catalog covering every layer family.
pub const CATALOG_YAML: &str = r#"
layers:
  - name: Administrative Boundaries
    base_id: admin1
    family: boundary
    use_cached_endpoint: true
    protected: true
  - name: Rivers
    base_id: rivers
    family: boundary
    use_cached_endpoint: true
  - name: Inundation Map
    base_id: flood_hazard_map_floodproofs
    family: hazard
    needs_date: true
  - name: Affected Population
    base_id: Impact_affectedpopulation
    family: impact
    needs_date: true
  - name: Affected GDP
    base_id: Impact_impactedgdp
    family: impact
    needs_date: true
  - name: Total People Affected
    base_id: popafftot_%date%
    family: ibew
    needs_date: true
  - name: Health Facilities Affected
    base_id: healthtot_%date%
    family: ibew
    needs_date: true
    title: Health Centers Affected
"#;

/// Catalog with an IBEW layer missing its placeholder.
pub const CATALOG_YAML_INVALID_IBEW: &str = r#"
layers:
  - name: Total People Affected
    base_id: popafftot
    family: ibew
    needs_date: true
"#;

/// Viewer configuration pointing at local endpoints.
pub const VIEWER_CONFIG_YAML: &str = r#"
endpoints:
  cached: "http://localhost:8081/mapcache/wms"
  direct: "http://localhost:8081/cgi-bin/mapserv?map=/etc/mapserver/floodwatch.map"
  mapserver: "http://localhost:8081/cgi-bin/mapserv"
  mapfile: "/etc/mapserver/ibew_getfeatureinfo.map"
stations:
  dev_base: "public/data"
  production_base: "/static/data"
  file: "stations.geojson"
  poll_interval_secs: 30
"#;

/// The smallest well-formed click-query body.
pub const GFI_SINGLE_FEATURE: &str = "Feature 1:\nflood_tot = 12.5\nNAME_1 = 'Turkana'\n";

/// A MapServer text/plain response with headers and two features.
pub const GFI_TWO_FEATURES: &str = "GetFeatureInfo results:

Layer 'popafftot_20250624'
  Feature 0:
    NAME_0 = 'Kenya'
    NAME_1 = 'Turkana'
    GID_0 = 'KEN'
    pop_tot = '926976'
    flood_tot = '1534.2'
    flood_perc = '0.001655'
  Feature 1:
    NAME_0 = 'Kenya'
    NAME_1 = 'Marsabit'
    GID_0 = 'KEN'
    pop_tot = '459785'
    flood_tot = '0'
    flood_perc = '0.000000000000000'
";

/// MapServer's answer when the click hits no feature.
pub const GFI_NO_RESULTS: &str = "GetFeatureInfo results:

Search returned no results.
";

/// Service exception delivered with HTTP 200.
pub const GFI_SERVICE_EXCEPTION: &str = r#"<?xml version='1.0' encoding="UTF-8" standalone="no" ?>
<!DOCTYPE ServiceExceptionReport SYSTEM "http://schemas.opengis.net/wms/1.1.1/exception_1_1_1.dtd">
<ServiceExceptionReport version="1.1.1">
<ServiceException code="LayerNotDefined">
msWMSFeatureInfo(): WMS server error. Invalid query layer name: popafftot_20991231
</ServiceException>
</ServiceExceptionReport>
"#;
