//! Map session: selection state plus the requests derived from it.
//!
//! Resolved GetMap requests are cached per layer and dropped whenever the
//! inputs they were derived from change, so a stale date never reaches the
//! renderer.

use std::collections::HashMap;

use floodwatch_common::{FloodwatchResult, LayerCatalog, LayerDescriptor, MapDate};
use floodwatch_wms::request::{get_feature_info, get_map, legend_graphic};
use floodwatch_wms::{is_date_scoped, ClickPoint, ResolvedRequest, ViewState, WmsEndpoints};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::selection::{SelectionEvent, SelectionState};

/// A request paired with the display name of its layer.
#[derive(Debug, Clone, Serialize)]
pub struct LayerRequest {
    pub layer_name: String,
    /// Heading for the legend entry or feature card
    pub title: String,
    pub request: ResolvedRequest,
}

impl LayerRequest {
    fn new(layer: &LayerDescriptor, date: Option<MapDate>, request: ResolvedRequest) -> Self {
        Self {
            layer_name: layer.name.clone(),
            title: layer.display_title(date),
            request,
        }
    }
}

pub struct MapSession {
    catalog: LayerCatalog,
    endpoints: WmsEndpoints,
    selection: SelectionState,
    resolved: HashMap<String, ResolvedRequest>,
}

impl MapSession {
    pub fn new(catalog: LayerCatalog, endpoints: WmsEndpoints) -> Self {
        let selection = SelectionState::new(&catalog);
        Self {
            catalog,
            endpoints,
            selection,
            resolved: HashMap::new(),
        }
    }

    /// Activate the given layers on top of the protected set.
    ///
    /// Keys are layer ids or display names. Unknown keys are skipped, not fatal.
    pub fn restore<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        for key in keys {
            let id = self.catalog.find(key).map_or(key, |l| l.base_id.as_str());
            if let Err(e) = self.selection.select(&self.catalog, id) {
                warn!(layer = %key, error = %e, "Skipping unknown layer in initial selection");
            }
        }
        info!(active = self.selection.active_count(), "Restored layer selection");
    }

    pub fn catalog(&self) -> &LayerCatalog {
        &self.catalog
    }

    pub fn endpoints(&self) -> &WmsEndpoints {
        &self.endpoints
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn active_date(&self) -> Option<MapDate> {
        self.selection.active_date()
    }

    /// Number of requests currently held in the derivation cache.
    pub fn cached_count(&self) -> usize {
        self.resolved.len()
    }

    /// Toggle a layer and drop cached requests for everything it turned off.
    pub fn toggle(&mut self, base_id: &str) -> FloodwatchResult<Vec<SelectionEvent>> {
        let events = self.selection.toggle(&self.catalog, base_id)?;
        for event in &events {
            if let SelectionEvent::Deselected(id) = event {
                self.resolved.remove(id);
            }
            debug!(?event, "Selection changed");
        }
        Ok(events)
    }

    /// Change the active date, invalidating only date-bearing layers.
    ///
    /// Dates after today are rejected with `InvalidDate`.
    pub fn set_date(&mut self, date: Option<MapDate>) -> FloodwatchResult<()> {
        self.set_date_as_of(date, MapDate::today())
    }

    /// [`set_date`](Self::set_date) against an explicit notion of today.
    pub fn set_date_as_of(
        &mut self,
        date: Option<MapDate>,
        today: MapDate,
    ) -> FloodwatchResult<()> {
        if !self.selection.set_date(date, today)? {
            return Ok(());
        }

        let stale: Vec<String> = self
            .resolved
            .keys()
            .filter(|id| self.catalog.get(id).map_or(true, |l| l.needs_date))
            .cloned()
            .collect();
        for id in &stale {
            self.resolved.remove(id);
        }

        info!(
            date = ?date.map(|d| d.to_string()),
            invalidated = stale.len(),
            "Active date changed"
        );
        Ok(())
    }

    /// Active layers in catalog order. Active ids missing from the catalog are skipped.
    fn active_layers(&self) -> Vec<&LayerDescriptor> {
        for id in self.selection.active_ids() {
            if self.catalog.get(id).is_none() {
                warn!(layer = %id, "Active layer not in catalog, skipping");
            }
        }
        self.catalog
            .iter()
            .filter(|l| self.selection.is_active(&l.base_id))
            .collect()
    }

    /// GetMap requests for every active layer, in catalog order.
    pub fn resolved_requests(&mut self) -> FloodwatchResult<Vec<ResolvedRequest>> {
        let date = self.selection.active_date();
        let missing: Vec<LayerDescriptor> = self
            .active_layers()
            .into_iter()
            .filter(|l| !self.resolved.contains_key(&l.base_id))
            .cloned()
            .collect();

        for layer in &missing {
            let request = get_map(layer, date, &self.endpoints)?;
            debug!(layer = %layer.base_id, param = %request.layer_param, "Resolved GetMap request");
            self.resolved.insert(layer.base_id.clone(), request);
        }

        Ok(self
            .active_layers()
            .into_iter()
            .filter_map(|l| self.resolved.get(&l.base_id).cloned())
            .collect())
    }

    /// Active date-bearing layers whose requests carry no date, in catalog order.
    pub fn undated_layers(&self) -> Vec<&str> {
        let date = self.selection.active_date();
        self.active_layers()
            .into_iter()
            .filter(|l| l.needs_date && !is_date_scoped(l, date))
            .map(|l| l.base_id.as_str())
            .collect()
    }

    /// Legend requests for every active layer.
    pub fn legends(&self) -> FloodwatchResult<Vec<LayerRequest>> {
        let date = self.selection.active_date();
        self.active_layers()
            .into_iter()
            .map(|layer| {
                let request = legend_graphic(layer, date, &self.endpoints)?;
                Ok(LayerRequest::new(layer, date, request))
            })
            .collect()
    }

    /// One GetFeatureInfo request per active date-bearing layer.
    pub fn feature_info_requests(
        &self,
        view: &ViewState,
        click: ClickPoint,
    ) -> FloodwatchResult<Vec<LayerRequest>> {
        let date = self.selection.active_date();
        self.active_layers()
            .into_iter()
            .filter(|l| l.needs_date)
            .map(|layer| {
                let request = get_feature_info(layer, date, &self.endpoints, view, click)?;
                Ok(LayerRequest::new(layer, date, request))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> MapSession {
        MapSession::new(LayerCatalog::builtin(), WmsEndpoints::default())
    }

    #[test]
    fn test_date_change_keeps_undated_cache() {
        let mut session = session();
        session.toggle("rivers").unwrap();
        session.toggle("Impact_affectedcrops").unwrap();
        session.set_date(MapDate::parse("2025-06-24").ok()).unwrap();
        assert_eq!(session.resolved_requests().unwrap().len(), 3);
        assert_eq!(session.cached_count(), 3);

        session.set_date(MapDate::parse("2025-06-25").ok()).unwrap();
        // admin1 and rivers survive, the impact layer is re-derived
        assert_eq!(session.cached_count(), 2);

        let requests = session.resolved_requests().unwrap();
        let impact = requests.iter().find(|r| r.layer_id == "Impact_affectedcrops").unwrap();
        assert_eq!(impact.layer_param, "Impact_affectedcrops_20250625");
    }

    #[test]
    fn test_undated_layers_until_date_set() {
        let mut session = session();
        session.toggle("rivers").unwrap();
        session.toggle("popafftot_%date%").unwrap();
        assert_eq!(session.undated_layers(), vec!["popafftot_%date%"]);

        session.set_date(MapDate::parse("2025-06-24").ok()).unwrap();
        assert!(session.undated_layers().is_empty());
    }

    #[test]
    fn test_same_date_does_not_invalidate() {
        let mut session = session();
        session.toggle("Impact_affectedcrops").unwrap();
        session.set_date(MapDate::parse("2025-06-24").ok()).unwrap();
        session.resolved_requests().unwrap();
        session.set_date(MapDate::parse("2025-06-24").ok()).unwrap();
        assert_eq!(session.cached_count(), 2);
    }
}
