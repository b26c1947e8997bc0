//! Uniform contract every rendering backend under test satisfies.

use crate::domain::errors::{BenchError, BenchResult};
use crate::domain::workload::{Position, Workload};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

/// Identifier of one interchangeable renderer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumString,
    AsRefStr,
    StrumDisplay,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    Leaflet,
    OpenLayers,
    MapLibre,
    DeckGl,
}

impl BackendId {
    /// Name shown in progress messages and charts.
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendId::Leaflet => "Leaflet",
            BackendId::OpenLayers => "OpenLayers",
            BackendId::MapLibre => "MapLibre GL",
            BackendId::DeckGl => "deck.gl",
        }
    }
}

/// Map layers a backend can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum Layer {
    Points,
    Polygons,
    Lines,
    Heatmap,
    Cluster,
}

impl Layer {
    /// Layers hidden during the points-only stress test.
    pub const NON_POINT: [Layer; 4] = [Layer::Polygons, Layer::Lines, Layer::Heatmap, Layer::Cluster];
}

/// Driver interface for one renderer.
///
/// `update_positions` is called once per measured frame and must not
/// reallocate backend structures when the entity count is unchanged.
/// `resize` re-syncs the viewport after activation; backends that need
/// no re-sync simply return `Ok(())`.
pub trait RenderBackend {
    fn id(&self) -> BackendId;

    fn activate(&mut self) -> LocalBoxFuture<'_, BenchResult<()>>;

    fn load_workload(&mut self, workload: &Workload) -> BenchResult<()>;

    fn update_positions(&mut self, positions: &[Position]) -> BenchResult<()>;

    fn set_layer_visible(&mut self, layer: Layer, visible: bool) -> BenchResult<()>;

    fn resize(&mut self) -> BenchResult<()>;
}

/// Adapters keyed by backend identifier.
#[derive(Default)]
pub struct BackendRegistry {
    adapters: BTreeMap<BackendId, Box<dyn RenderBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter, replacing any previous one for the same id.
    pub fn register(&mut self, adapter: Box<dyn RenderBackend>) -> Option<Box<dyn RenderBackend>> {
        self.adapters.insert(adapter.id(), adapter)
    }

    pub fn get_mut(&mut self, id: BackendId) -> BenchResult<&mut (dyn RenderBackend + 'static)> {
        self.adapters
            .get_mut(&id)
            .map(|adapter| adapter.as_mut())
            .ok_or(BenchError::UnknownBackend(id))
    }

    pub fn contains(&self, id: BackendId) -> bool {
        self.adapters.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<BackendId> {
        self.adapters.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn backend_ids_have_stable_keys() {
        let keys: Vec<String> = BackendId::iter().map(|id| id.to_string()).collect();
        assert_eq!(keys, ["leaflet", "openlayers", "maplibre", "deckgl"]);
        assert_eq!(BackendId::from_str("maplibre").ok(), Some(BackendId::MapLibre));
        assert_eq!(serde_json::to_string(&BackendId::DeckGl).ok().as_deref(), Some("\"deckgl\""));
    }

    #[test]
    fn non_point_layers_exclude_points() {
        assert!(!Layer::NON_POINT.contains(&Layer::Points));
        assert_eq!(Layer::Heatmap.as_ref(), "heatmap");
    }
}
