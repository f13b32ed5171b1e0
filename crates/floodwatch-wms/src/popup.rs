//! Presentation of click-query attributes in the map popup.

use serde::Serialize;

use crate::getfeatureinfo::Feature;

/// Administrative attributes hidden from the attribute listing.
const ADMIN_ATTRIBUTES: &[&str] = &["NAME_0", "NAME_1", "CODE_ADM", "GID_0", "ENGTYPE_1", "COD"];

/// Layer whose popup shows only the population totals.
const TOTAL_AFFECTED_PREFIX: &str = "popafftot";

const MAX_KEY_METRICS: usize = 4;

/// Severity bucket for a `flood_tot` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImpactLevel {
    None,
    Low,
    Medium,
    High,
}

impl ImpactLevel {
    /// Classify a raw attribute value; unparseable values count as no impact.
    pub fn classify(value: &str) -> Self {
        match parse_number(value) {
            None => ImpactLevel::None,
            Some(v) if v <= 0.0 => ImpactLevel::None,
            Some(v) if v <= 100.0 => ImpactLevel::Low,
            Some(v) if v <= 1000.0 => ImpactLevel::Medium,
            Some(_) => ImpactLevel::High,
        }
    }

    /// Accent color used for the feature card.
    pub fn color(&self) -> &'static str {
        match self {
            ImpactLevel::None => "#28a745",
            ImpactLevel::Low => "#ffc107",
            ImpactLevel::Medium => "#fd7e14",
            ImpactLevel::High => "#dc3545",
        }
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `1234567` -> `1,234,567`
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Display form of an attribute value.
pub fn format_value(key: &str, value: &str) -> String {
    if value.is_empty() || value == "null" {
        return "No data".to_string();
    }

    match (key, parse_number(value)) {
        ("flood_tot" | "pop_tot", Some(v)) => {
            if v == 0.0 {
                "0".to_string()
            } else if v < 1.0 {
                format!("{:.3}", v)
            } else {
                group_thousands(v.round() as i64)
            }
        }
        ("flood_perc", Some(v)) => format!("{:.2}%", v * 100.0),
        _ => value.to_string(),
    }
}

/// `flood_tot` -> `Flood Tot`
pub fn humanize_key(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_total_affected(layer_param: &str) -> bool {
    layer_param.contains(TOTAL_AFFECTED_PREFIX)
}

fn is_admin_key(key: &str) -> bool {
    matches!(key, "LACK_CC" | "GID_0")
        || key.starts_with("NAME_")
        || key.starts_with("CODE_")
        || key.starts_with("ENGTYPE_")
        || key.starts_with("COD")
}

/// Headline numeric attributes for a feature card.
pub fn key_metrics<'a>(layer_param: &str, feature: &'a Feature) -> Vec<(&'a str, &'a str)> {
    let numeric = feature.iter().filter(|(_, v)| parse_number(v).is_some());

    if is_total_affected(layer_param) {
        numeric
            .filter(|(k, _)| *k == "pop_tot" || *k == "flood_tot")
            .collect()
    } else {
        numeric
            .filter(|(k, _)| !is_admin_key(k))
            .take(MAX_KEY_METRICS)
            .collect()
    }
}

/// Flood share and class, shown when present and non-trivial.
pub fn secondary_metrics<'a>(
    layer_param: &str,
    feature: &'a Feature,
) -> Vec<(&'static str, &'a str)> {
    if is_total_affected(layer_param) {
        return Vec::new();
    }

    let mut metrics = Vec::new();
    if let Some(perc) = feature.get("flood_perc") {
        if perc != "0.000000000000000" {
            metrics.push(("Flood %", perc));
        }
    }
    if let Some(class) = feature.get("flood_clas") {
        if class != "0" {
            metrics.push(("Flood Class", class));
        }
    }
    metrics
}

/// Attributes listed under "View all properties".
pub fn visible_attributes<'a>(layer_param: &str, feature: &'a Feature) -> Vec<(&'a str, &'a str)> {
    let show_all = is_total_affected(layer_param);
    feature
        .iter()
        .filter(|(k, _)| show_all || !ADMIN_ATTRIBUTES.contains(k))
        .collect()
}

/// `Turkana, Kenya` from the admin-name attributes.
pub fn location_label(feature: &Feature) -> Option<String> {
    let parts: Vec<&str> = [feature.get("NAME_1"), feature.get("NAME_0")]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}
