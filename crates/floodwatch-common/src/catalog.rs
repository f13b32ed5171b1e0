//! Layer registry.
//!
//! The catalog is the single source of truth for which overlays the viewer can
//! toggle. It can be loaded from a YAML document or taken from the built-in
//! dashboard catalog.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::{FloodwatchError, FloodwatchResult, LayerDescriptor, LayerFamily};

/// IBEW layers in legend order: `(prefix, display name, mapfile title)`.
const IBEW_LAYERS: &[(&str, &str, &str)] = &[
    ("healthtot", "Health Facilities Affected", "Health Centers Affected"),
    ("popaff100", "People Affected (100cm)", "People Affected 100cm"),
    ("popaff25", "People Affected (25cm)", "People Affected 25cm"),
    ("popafftot", "Total People Affected", "Total People Affected"),
    ("popage100", "Vulnerable Age Groups (100cm)", "Vulnerable Age Groups 100cm"),
    ("popage25", "Vulnerable Age Groups (25cm)", "Vulnerable Age Groups 25cm"),
    ("popmob100", "Reduced Mobility (100cm)", "Reduced Mobility 100cm"),
    ("popmob25", "Reduced Mobility (25cm)", "Reduced Mobility 25cm"),
];

const IMPACT_LAYERS: &[(&str, &str)] = &[
    ("Affected Population", "Impact_affectedpopulation"),
    ("Affected GDP", "Impact_impactedgdp"),
    ("Affected Crops", "Impact_affectedcrops"),
    ("Affected Roads", "Impact_affectedroads"),
    ("Displaced Population", "Impact_displacedpopulation"),
    ("Affected Livestock", "Impact_affectedlivestock"),
    ("Affected Grazing Land", "Impact_affectedgrazingland"),
    ("Sector Data", "Impact_sectordata"),
];

/// Catalog document as stored on disk.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    layers: Vec<LayerDescriptor>,
}

/// Ordered, validated collection of layer descriptors.
#[derive(Debug, Clone, Default)]
pub struct LayerCatalog {
    layers: Vec<LayerDescriptor>,
}

impl LayerCatalog {
    /// Build a catalog, rejecting invalid descriptors and duplicate names or ids.
    pub fn new(layers: Vec<LayerDescriptor>) -> FloodwatchResult<Self> {
        let mut names = HashSet::new();
        let mut ids = HashSet::new();

        for layer in &layers {
            layer.validate()?;
            if !names.insert(layer.name.as_str()) {
                return Err(FloodwatchError::DuplicateLayer(layer.name.clone()));
            }
            if !ids.insert(layer.base_id.as_str()) {
                return Err(FloodwatchError::DuplicateLayer(layer.base_id.clone()));
            }
        }

        Ok(Self { layers })
    }

    /// Parse a catalog from YAML.
    pub fn from_yaml_str(yaml: &str) -> FloodwatchResult<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        Self::new(file.layers)
    }

    /// Load a catalog from a YAML file.
    pub fn load(path: &Path) -> FloodwatchResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FloodwatchError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_yaml_str(&content)?;
        info!(path = %path.display(), count = catalog.len(), "Loaded layer catalog");
        Ok(catalog)
    }

    /// The dashboard's built-in layers.
    pub fn builtin() -> Self {
        let mut layers = vec![
            LayerDescriptor::new("Administrative Boundaries", "admin1", LayerFamily::Boundary)
                .cached()
                .protected(),
            LayerDescriptor::new("Country Boundaries", "admin0", LayerFamily::Boundary).cached(),
            LayerDescriptor::new("Rivers", "rivers", LayerFamily::Boundary).cached(),
            LayerDescriptor::new("Lakes", "lakes", LayerFamily::Boundary).cached(),
            LayerDescriptor::new(
                "Inundation Map",
                "flood_hazard_map_floodproofs",
                LayerFamily::Hazard,
            )
            .with_date(),
            LayerDescriptor::new("Alerts Map", "Alerts", LayerFamily::Hazard),
        ];

        layers.extend(IMPACT_LAYERS.iter().map(|(name, id)| {
            LayerDescriptor::new(*name, *id, LayerFamily::Impact).with_date()
        }));

        layers.extend(IBEW_LAYERS.iter().map(|(prefix, name, title)| {
            LayerDescriptor::new(*name, format!("{}_%date%", prefix), LayerFamily::Ibew)
                .with_date()
                .titled(*title)
        }));

        debug!(count = layers.len(), "Built-in layer catalog");
        Self { layers }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.layers.iter()
    }

    /// Find a layer by its WMS identifier.
    pub fn get(&self, base_id: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.base_id == base_id)
    }

    /// Find a layer by its display name.
    pub fn get_by_name(&self, name: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Find by WMS identifier, falling back to the display name.
    pub fn find(&self, key: &str) -> Option<&LayerDescriptor> {
        self.get(key).or_else(|| self.get_by_name(key))
    }

    /// Like [`get`](Self::get), but a missing layer is an error.
    pub fn require(&self, base_id: &str) -> FloodwatchResult<&LayerDescriptor> {
        self.get(base_id)
            .ok_or_else(|| FloodwatchError::LayerNotFound(base_id.to_string()))
    }

    pub fn family(&self, family: LayerFamily) -> impl Iterator<Item = &LayerDescriptor> {
        self.layers.iter().filter(move |l| l.family == family)
    }

    /// Identifiers of the minimum boundary set.
    pub fn protected_ids(&self) -> impl Iterator<Item = &str> {
        self.layers
            .iter()
            .filter(|l| l.protected)
            .map(|l| l.base_id.as_str())
    }
}
