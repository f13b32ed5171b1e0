//! Tests for the text/plain GetFeatureInfo parser.

use floodwatch_wms::{classify_response, parse_feature_info, FeatureInfoBody};
use test_utils::{
    feature_info_body, GFI_NO_RESULTS, GFI_SERVICE_EXCEPTION, GFI_SINGLE_FEATURE, GFI_TWO_FEATURES,
};

#[test]
fn test_single_feature() {
    let features = parse_feature_info(GFI_SINGLE_FEATURE);
    assert_eq!(features.len(), 1);

    let feature = &features[0];
    assert_eq!(feature.id, "Feature 1:");
    assert_eq!(
        feature.attributes,
        vec![
            ("flood_tot".to_string(), "12.5".to_string()),
            ("NAME_1".to_string(), "Turkana".to_string()),
        ]
    );
}

#[test]
fn test_mapserver_body_with_headers() {
    let features = parse_feature_info(GFI_TWO_FEATURES);
    assert_eq!(features.len(), 2);
    assert_eq!(features[0].get("NAME_1"), Some("Turkana"));
    assert_eq!(features[0].get("pop_tot"), Some("926976"));
    assert_eq!(features[1].get("NAME_1"), Some("Marsabit"));
    assert_eq!(features[1].get("flood_tot"), Some("0"));
    assert_eq!(features[1].len(), 6);
}

#[test]
fn test_no_results_marker() {
    assert!(parse_feature_info(GFI_NO_RESULTS).is_empty());
    assert_eq!(classify_response(GFI_NO_RESULTS), FeatureInfoBody::NoResults);
}

#[test]
fn test_no_results_marker_with_features_still_empty() {
    let body = format!("{}\nSearch returned no results.\n", GFI_SINGLE_FEATURE);
    assert!(parse_feature_info(&body).is_empty());
}

#[test]
fn test_service_exception() {
    assert!(parse_feature_info(GFI_SERVICE_EXCEPTION).is_empty());
    match classify_response(GFI_SERVICE_EXCEPTION) {
        FeatureInfoBody::ServiceException(message) => {
            assert!(message.contains("Invalid query layer name"));
        }
        other => panic!("Expected service exception, got {:?}", other),
    }
}

#[test]
fn test_empty_feature_blocks_dropped() {
    let body = "Feature 0:\nFeature 1:\nflood_tot = 4\nFeature 2:\n";
    let features = parse_feature_info(body);
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].id, "Feature 1:");
}

#[test]
fn test_empty_body() {
    assert!(parse_feature_info("").is_empty());
    assert_eq!(classify_response("   \n"), FeatureInfoBody::NoResults);
}

#[test]
fn test_generated_body_preserves_order() {
    let body = feature_info_body(
        "healthtot_20250624",
        &[&[("NAME_1", "Garissa"), ("health_tot", "3"), ("flood_tot", "250")]],
    );
    let features = parse_feature_info(&body);
    let keys: Vec<&str> = features[0].iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["NAME_1", "health_tot", "flood_tot"]);
}

#[test]
fn test_double_quoted_values() {
    let features = parse_feature_info("Feature 3:\nNAME_0 = \"Uganda\"\n");
    assert_eq!(features[0].get("NAME_0"), Some("Uganda"));
}
