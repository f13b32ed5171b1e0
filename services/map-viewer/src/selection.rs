//! Layer selection state machine.
//!
//! Holds which layers are toggled on and the date applied to every
//! date-bearing layer. Transitions are explicit so the family invariants
//! can be checked:
//! - `impact` and `ibew` have at most one active member each; selecting a
//!   new member evicts the old one first.
//! - The protected boundary layers can never all be removed.
//! - The active date is never later than today.

use std::collections::BTreeSet;

use floodwatch_common::{
    FloodwatchError, FloodwatchResult, LayerCatalog, LayerDescriptor, LayerFamily, MapDate,
};
use serde::Serialize;
use tracing::debug;

/// Externally observable effect of a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "layer", rename_all = "snake_case")]
pub enum SelectionEvent {
    Selected(String),
    Deselected(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    active: BTreeSet<String>,
    active_date: Option<MapDate>,
}

impl SelectionState {
    /// Initial state: the protected boundary layers on, no date.
    pub fn new(catalog: &LayerCatalog) -> Self {
        Self {
            active: catalog.protected_ids().map(str::to_string).collect(),
            active_date: None,
        }
    }

    pub fn is_active(&self, base_id: &str) -> bool {
        self.active.contains(base_id)
    }

    pub fn active_ids(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(String::as_str)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn active_date(&self) -> Option<MapDate> {
        self.active_date
    }

    /// Active layers of one family, in id order.
    pub fn active_in_family<'a>(
        &'a self,
        catalog: &'a LayerCatalog,
        family: LayerFamily,
    ) -> impl Iterator<Item = &'a LayerDescriptor> + 'a {
        self.active
            .iter()
            .filter_map(|id| catalog.get(id))
            .filter(move |l| l.family == family)
    }

    /// Flip a layer on or off.
    pub fn toggle(
        &mut self,
        catalog: &LayerCatalog,
        base_id: &str,
    ) -> FloodwatchResult<Vec<SelectionEvent>> {
        if self.is_active(base_id) {
            self.deselect(catalog, base_id)
        } else {
            self.select(catalog, base_id)
        }
    }

    /// Turn a layer on, evicting the active member of an exclusive family.
    pub fn select(
        &mut self,
        catalog: &LayerCatalog,
        base_id: &str,
    ) -> FloodwatchResult<Vec<SelectionEvent>> {
        let layer = catalog.require(base_id)?;
        if self.is_active(base_id) {
            return Ok(Vec::new());
        }

        let mut events = Vec::new();
        if layer.family.is_exclusive() {
            let evicted: Vec<String> = self
                .active_in_family(catalog, layer.family)
                .map(|l| l.base_id.clone())
                .collect();
            for id in evicted {
                self.active.remove(&id);
                debug!(layer = %id, family = %layer.family, "Evicted by exclusive selection");
                events.push(SelectionEvent::Deselected(id));
            }
        }

        self.active.insert(layer.base_id.clone());
        events.push(SelectionEvent::Selected(layer.base_id.clone()));
        Ok(events)
    }

    /// Turn a layer off. Removing the last active protected layer is a no-op.
    pub fn deselect(
        &mut self,
        catalog: &LayerCatalog,
        base_id: &str,
    ) -> FloodwatchResult<Vec<SelectionEvent>> {
        let layer = catalog.require(base_id)?;
        if !self.is_active(base_id) {
            return Ok(Vec::new());
        }

        if layer.protected {
            let protected_active = catalog
                .protected_ids()
                .filter(|id| self.is_active(id))
                .count();
            if protected_active <= 1 {
                debug!(layer = %base_id, "Refusing to remove the last protected boundary layer");
                return Ok(Vec::new());
            }
        }

        self.active.remove(base_id);
        Ok(vec![SelectionEvent::Deselected(base_id.to_string())])
    }

    /// Change the date without touching the active layers.
    ///
    /// Dates after `today` are rejected and leave the state untouched.
    /// Returns whether the date actually changed.
    pub fn set_date(&mut self, date: Option<MapDate>, today: MapDate) -> FloodwatchResult<bool> {
        if let Some(date) = date.filter(|d| *d > today) {
            return Err(FloodwatchError::InvalidDate(format!("{} is after {}", date, today)));
        }
        let changed = self.active_date != date;
        self.active_date = date;
        Ok(changed)
    }
}
