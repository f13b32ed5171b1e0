//! Tests for BoundingBox parsing and validation.

use floodwatch_common::{BoundingBox, FloodwatchError};
use test_utils::bbox::{EAST_AFRICA, INVERTED, KENYA};

fn from_tuple((w, s, e, n): (f64, f64, f64, f64)) -> BoundingBox {
    BoundingBox::new(w, s, e, n)
}

// ============================================================================
// from_wms_string tests
// ============================================================================

#[test]
fn test_parse_wms_bbox_integer() {
    let bbox = BoundingBox::from_wms_string("30,-5,45,15").unwrap();
    assert_eq!(bbox, BoundingBox::new(30.0, -5.0, 45.0, 15.0));
}

#[test]
fn test_parse_wms_bbox_floating() {
    let bbox = BoundingBox::from_wms_string("33.9,-4.7,41.9,5.0").unwrap();
    assert_eq!(bbox, from_tuple(KENYA));
}

#[test]
fn test_parse_wms_bbox_too_few() {
    let result = BoundingBox::from_wms_string("0,0,100");
    assert!(matches!(result, Err(FloodwatchError::InvalidBbox(_))));
}

#[test]
fn test_parse_wms_bbox_too_many() {
    let result = BoundingBox::from_wms_string("0,0,100,100,200");
    assert!(matches!(result, Err(FloodwatchError::InvalidBbox(_))));
}

#[test]
fn test_parse_wms_bbox_invalid_number() {
    let result = BoundingBox::from_wms_string("abc,0,100,100");
    assert!(matches!(result, Err(FloodwatchError::InvalidBbox(_))));
}

#[test]
fn test_parse_wms_bbox_empty_string() {
    assert!(BoundingBox::from_wms_string("").is_err());
}

#[test]
fn test_parse_wms_bbox_inverted() {
    let result = BoundingBox::from_wms_string("41.9,-4.7,33.9,5.0");
    assert!(matches!(result, Err(FloodwatchError::InvalidBbox(_))));
}

// ============================================================================
// Formatting and geometry
// ============================================================================

#[test]
fn test_wms_string_roundtrips_view_bounds() {
    let bbox = from_tuple(EAST_AFRICA);
    let parsed = BoundingBox::from_wms_string(&bbox.to_wms_string()).unwrap();
    assert_eq!(parsed, bbox);
}

#[test]
fn test_validate_rejects_inverted_and_nan() {
    assert!(from_tuple(INVERTED).validate().is_err());
    assert!(BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0).validate().is_err());
    assert!(from_tuple(KENYA).validate().is_ok());
}

#[test]
fn test_dimensions() {
    let bbox = BoundingBox::new(30.0, -5.0, 45.0, 15.0);
    assert_eq!(bbox.width(), 15.0);
    assert_eq!(bbox.height(), 20.0);
}
