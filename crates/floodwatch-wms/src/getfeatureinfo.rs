//! MapServer text/plain GetFeatureInfo parsing.
//!
//! A response looks like:
//!
//! ```text
//! GetFeatureInfo results:
//!
//! Layer 'popafftot_20250624'
//!   Feature 0:
//!     NAME_1 = 'Turkana'
//!     flood_tot = '1534.2'
//! ```
//!
//! Service exceptions and empty searches arrive with HTTP 200 and are
//! recognized by text markers. The parser knows nothing about the catalog.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const SERVICE_EXCEPTION_MARKER: &str = "ServiceException";
pub const NO_RESULTS_MARKER: &str = "Search returned no results";

/// One feature block from a GetFeatureInfo response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// The block header, e.g. `Feature 0:`
    pub id: String,
    /// Attributes in response order
    pub attributes: Vec<(String, String)>,
}

impl Feature {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            attributes: Vec::new(),
        }
    }

    /// Value of `key`. A repeated key reads as its last occurrence.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// What a response body turned out to contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureInfoBody {
    Features(Vec<Feature>),
    NoResults,
    /// Exception report delivered in place of results
    ServiceException(String),
}

impl FeatureInfoBody {
    /// Features in the body; exceptions and empty searches have none.
    pub fn into_features(self) -> Vec<Feature> {
        match self {
            FeatureInfoBody::Features(features) => features,
            FeatureInfoBody::NoResults | FeatureInfoBody::ServiceException(_) => Vec::new(),
        }
    }
}

/// Classify and parse a text/plain GetFeatureInfo body.
pub fn classify_response(body: &str) -> FeatureInfoBody {
    if body.contains(SERVICE_EXCEPTION_MARKER) {
        let message = exception_message(body);
        debug!(message = %message, "GetFeatureInfo returned a service exception");
        return FeatureInfoBody::ServiceException(message);
    }
    if body.contains(NO_RESULTS_MARKER) {
        return FeatureInfoBody::NoResults;
    }

    let features = parse_features(body);
    if features.is_empty() {
        FeatureInfoBody::NoResults
    } else {
        FeatureInfoBody::Features(features)
    }
}

/// Parse a GetFeatureInfo body into features; marker responses yield none.
pub fn parse_feature_info(body: &str) -> Vec<Feature> {
    classify_response(body).into_features()
}

fn parse_features(body: &str) -> Vec<Feature> {
    let mut features = Vec::new();
    let mut current: Option<Feature> = None;

    for line in body.lines() {
        let line = line.trim();

        if line.is_empty()
            || line.starts_with("GetFeatureInfo results")
            || line.starts_with("Layer '")
        {
            continue;
        }

        if is_feature_header(line) {
            if let Some(feature) = current.take() {
                if !feature.is_empty() {
                    features.push(feature);
                }
            }
            current = Some(Feature::new(line));
        } else if let (Some(feature), Some((key, value))) =
            (current.as_mut(), line.split_once('='))
        {
            let key = key.trim();
            if !key.is_empty() {
                feature
                    .attributes
                    .push((key.to_string(), strip_quotes(value.trim()).to_string()));
            }
        }
    }

    if let Some(feature) = current {
        if !feature.is_empty() {
            features.push(feature);
        }
    }

    features
}

/// `Feature <N>:`
fn is_feature_header(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("Feature ") else {
        return false;
    };
    match rest.split_once(':') {
        Some((number, tail)) => {
            !number.is_empty()
                && number.bytes().all(|b| b.is_ascii_digit())
                && tail.trim().is_empty()
        }
        None => false,
    }
}

/// Strip one leading and one trailing quote character.
fn strip_quotes(value: &str) -> &str {
    let value = value
        .strip_prefix('\'')
        .or_else(|| value.strip_prefix('"'))
        .unwrap_or(value);
    value
        .strip_suffix('\'')
        .or_else(|| value.strip_suffix('"'))
        .unwrap_or(value)
}

/// Text of the first `<ServiceException>` element, or the raw body prefix.
fn exception_message(body: &str) -> String {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut in_exception = false;
    let mut message = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"ServiceException" => {
                in_exception = true;
            }
            Ok(Event::Text(t)) if in_exception => {
                if let Ok(text) = t.unescape() {
                    message.push_str(text.trim());
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"ServiceException" => break,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    if message.is_empty() {
        body.trim().chars().take(100).collect()
    } else {
        message
    }
}
