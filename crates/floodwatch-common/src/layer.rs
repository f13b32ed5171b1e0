//! Layer descriptors for the selectable WMS overlays.

use serde::{Deserialize, Serialize};

use crate::{FloodwatchError, FloodwatchResult, MapDate};

/// Placeholder left in IBEW layer identifiers for server-side substitution.
pub const DATE_PLACEHOLDER: &str = "%date%";

/// Classification governing how a layer is parameterized by date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerFamily {
    /// Administrative boundaries, rivers, lakes
    Boundary,
    /// Inundation and alert maps
    Hazard,
    /// Impact assessment layers (affected population, GDP, ...)
    Impact,
    /// Impact-based early warning layers resolved by the MapServer mapfile
    Ibew,
}

impl LayerFamily {
    /// At most one layer of an exclusive family may be active.
    pub fn is_exclusive(&self) -> bool {
        matches!(self, LayerFamily::Impact | LayerFamily::Ibew)
    }

    /// Whether the date reaches the server through query parameters
    /// instead of the layer identifier.
    pub fn uses_runtime_substitution(&self) -> bool {
        matches!(self, LayerFamily::Ibew)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerFamily::Boundary => "boundary",
            LayerFamily::Hazard => "hazard",
            LayerFamily::Impact => "impact",
            LayerFamily::Ibew => "ibew",
        }
    }
}

impl std::fmt::Display for LayerFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable map layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Human-readable label, unique within a catalog
    pub name: String,

    /// WMS layer identifier, optionally containing [`DATE_PLACEHOLDER`]
    pub base_id: String,

    pub family: LayerFamily,

    /// Whether requests for this layer are parameterized by the active date
    #[serde(default)]
    pub needs_date: bool,

    /// Serve GetMap through the tile cache instead of the direct renderer
    #[serde(default)]
    pub use_cached_endpoint: bool,

    /// Member of the minimum boundary set that cannot be fully removed
    #[serde(default)]
    pub protected: bool,

    /// Title the map server publishes for the layer, when it differs from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl LayerDescriptor {
    pub fn new(name: impl Into<String>, base_id: impl Into<String>, family: LayerFamily) -> Self {
        Self {
            name: name.into(),
            base_id: base_id.into(),
            family,
            needs_date: false,
            use_cached_endpoint: false,
            protected: false,
            title: None,
        }
    }

    pub fn with_date(mut self) -> Self {
        self.needs_date = true;
        self
    }

    pub fn cached(mut self) -> Self {
        self.use_cached_endpoint = true;
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Heading for legends and feature cards: the title (or name), suffixed
    /// with the date for date-bearing layers, e.g. `Total People Affected - 2025-06-24`.
    pub fn display_title(&self, date: Option<MapDate>) -> String {
        let title = self.title.as_deref().unwrap_or(&self.name);
        match date {
            Some(date) if self.needs_date => format!("{} - {}", title, date),
            _ => title.to_string(),
        }
    }

    /// Check the per-descriptor invariants.
    pub fn validate(&self) -> FloodwatchResult<()> {
        let invalid = |message: &str| FloodwatchError::InvalidLayer {
            layer: self.name.clone(),
            message: message.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.base_id.trim().is_empty() {
            return Err(invalid("base_id must not be empty"));
        }

        let placeholders = self.base_id.matches(DATE_PLACEHOLDER).count();
        match self.family {
            LayerFamily::Ibew if placeholders != 1 => {
                return Err(invalid("ibew base_id must contain %date% exactly once"));
            }
            LayerFamily::Ibew => {}
            _ if placeholders > 0 => {
                return Err(invalid("only ibew layers may carry the %date% placeholder"));
            }
            _ => {}
        }

        if self.protected && self.family != LayerFamily::Boundary {
            return Err(invalid("only boundary layers can be protected"));
        }
        Ok(())
    }
}
