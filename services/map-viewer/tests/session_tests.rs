//! Selection and request derivation tests for the map session.

use floodwatch_common::{BoundingBox, FloodwatchError, LayerCatalog, LayerFamily, MapDate};
use floodwatch_wms::{ClickPoint, ViewState, WmsEndpoints, WmsOperation};
use map_viewer::{MapSession, SelectionEvent, ViewerConfig};
use test_utils::bbox::KENYA;
use test_utils::{CATALOG_YAML, VIEWER_CONFIG_YAML};

fn session() -> MapSession {
    let catalog = LayerCatalog::from_yaml_str(CATALOG_YAML).unwrap();
    MapSession::new(catalog, WmsEndpoints::default())
}

fn date(s: &str) -> Option<MapDate> {
    Some(MapDate::parse(s).unwrap())
}

#[test]
fn test_starts_with_protected_boundary() {
    let mut session = session();
    let requests = session.resolved_requests().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].layer_id, "admin1");
    assert_eq!(requests[0].operation, WmsOperation::GetMap);
}

#[test]
fn test_ibew_exclusivity_invalidates_evicted_layer() {
    let mut session = session();
    session.set_date(date("2025-06-24")).unwrap();
    session.toggle("popafftot_%date%").unwrap();
    session.resolved_requests().unwrap();
    assert_eq!(session.cached_count(), 2);

    let events = session.toggle("healthtot_%date%").unwrap();
    assert_eq!(
        events,
        vec![
            SelectionEvent::Deselected("popafftot_%date%".to_string()),
            SelectionEvent::Selected("healthtot_%date%".to_string()),
        ]
    );
    assert_eq!(session.cached_count(), 1);

    let ids: Vec<String> = session
        .resolved_requests()
        .unwrap()
        .into_iter()
        .map(|r| r.layer_id)
        .collect();
    assert_eq!(ids, vec!["admin1", "healthtot_%date%"]);

    let ibew: Vec<_> = session
        .selection()
        .active_in_family(session.catalog(), LayerFamily::Ibew)
        .collect();
    assert_eq!(ibew.len(), 1);
}

#[test]
fn test_protected_layer_survives_toggle() {
    let mut session = session();
    assert!(session.toggle("admin1").unwrap().is_empty());
    assert!(session.selection().is_active("admin1"));
}

#[test]
fn test_requests_follow_catalog_order() {
    let mut session = session();
    session.set_date(date("2025-06-24")).unwrap();
    session.toggle("popafftot_%date%").unwrap();
    session.toggle("Impact_affectedpopulation").unwrap();
    session.toggle("rivers").unwrap();

    let params: Vec<String> = session
        .resolved_requests()
        .unwrap()
        .into_iter()
        .map(|r| r.layer_param)
        .collect();
    assert_eq!(
        params,
        vec![
            "admin1",
            "rivers",
            "Impact_affectedpopulation_20250624",
            "popafftot_%date%",
        ]
    );
}

#[test]
fn test_date_change_rederives_dated_layers() {
    let mut session = session();
    session.set_date(date("2025-06-24")).unwrap();
    session.toggle("popafftot_%date%").unwrap();
    session.toggle("flood_hazard_map_floodproofs").unwrap();
    session.resolved_requests().unwrap();

    session.set_date(date("2025-07-01")).unwrap();
    assert_eq!(session.cached_count(), 1);

    let requests = session.resolved_requests().unwrap();
    let ibew = requests.iter().find(|r| r.layer_id == "popafftot_%date%").unwrap();
    assert_eq!(ibew.param("date"), Some("20250701"));
    assert_eq!(ibew.param("datetime"), Some("202507010000"));
    let hazard = requests
        .iter()
        .find(|r| r.layer_id == "flood_hazard_map_floodproofs")
        .unwrap();
    assert_eq!(hazard.layer_param, "flood_hazard_map_floodproofs_20250701");
}

#[test]
fn test_future_date_keeps_cache() {
    let mut session = session();
    let today = MapDate::parse("2025-06-30").unwrap();
    session.set_date_as_of(date("2025-06-24"), today).unwrap();
    session.toggle("popafftot_%date%").unwrap();
    session.resolved_requests().unwrap();

    let err = session.set_date_as_of(date("2025-07-01"), today).unwrap_err();
    assert!(matches!(err, FloodwatchError::InvalidDate(_)));
    assert_eq!(session.active_date(), date("2025-06-24"));
    assert_eq!(session.cached_count(), 2);

    assert!(session.set_date(date("2099-12-31")).is_err());
    assert_eq!(session.active_date(), date("2025-06-24"));
}

#[test]
fn test_restore_skips_unknown_layers() {
    let mut session = session();
    session.restore(["rivers", "not_a_layer", "Impact_impactedgdp"]);
    let active: Vec<&str> = session.selection().active_ids().collect();
    assert_eq!(active, vec!["Impact_impactedgdp", "admin1", "rivers"]);
}

#[test]
fn test_feature_info_only_for_dated_layers() {
    let mut session = session();
    session.set_date(date("2025-06-24")).unwrap();
    session.restore(["rivers", "Impact_impactedgdp", "popafftot_%date%"]);

    let (w, s, e, n) = KENYA;
    let view = ViewState::new(BoundingBox::new(w, s, e, n), 800, 600);
    let requests = session
        .feature_info_requests(&view, ClickPoint::new(400.0, 300.0))
        .unwrap();

    let names: Vec<&str> = requests.iter().map(|r| r.layer_name.as_str()).collect();
    assert_eq!(names, vec!["Affected GDP", "Total People Affected"]);
    assert_eq!(requests[0].title, "Affected GDP - 2025-06-24");
    assert!(requests
        .iter()
        .all(|r| r.request.operation == WmsOperation::GetFeatureInfo));
}

#[test]
fn test_legends_for_active_layers() {
    let mut session = session();
    session.toggle("rivers").unwrap();
    let legends = session.legends().unwrap();
    assert_eq!(legends.len(), 2);
    assert_eq!(legends[1].request.param("LAYER"), Some("rivers"));
    assert_eq!(legends[1].title, "Rivers");
}

#[test]
fn test_legend_uses_published_title() {
    let mut session = session();
    session.set_date(date("2025-06-24")).unwrap();
    session.toggle("healthtot_%date%").unwrap();
    let legends = session.legends().unwrap();
    assert_eq!(legends[1].layer_name, "Health Facilities Affected");
    assert_eq!(legends[1].title, "Health Centers Affected - 2025-06-24");
}

#[test]
fn test_restore_accepts_display_names() {
    let mut session = session();
    session.restore(["Rivers", "Affected GDP", "popafftot_%date%"]);
    let active: Vec<&str> = session.selection().active_ids().collect();
    assert_eq!(active, vec!["Impact_impactedgdp", "admin1", "popafftot_%date%", "rivers"]);
    assert_eq!(session.undated_layers(), vec!["Impact_impactedgdp", "popafftot_%date%"]);
}

#[test]
fn test_unknown_toggle_is_error() {
    let mut session = session();
    assert!(session.toggle("popafftot").is_err());
}

#[test]
fn test_session_from_viewer_config() {
    let config = ViewerConfig::from_yaml_str(VIEWER_CONFIG_YAML).unwrap();
    assert_eq!(config.stations.poll_interval_secs, 30);

    let mut session = MapSession::new(config.load_catalog().unwrap(), config.endpoints.clone());
    session.toggle("lakes").unwrap();
    let requests = session.resolved_requests().unwrap();
    assert!(requests.iter().all(|r| r.url.starts_with("http://localhost:8081/mapcache/wms")));
}
