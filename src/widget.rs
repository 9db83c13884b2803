// 🗺️ Map widget contract - the external SDK seen as capabilities
//
// Rendering, tiling and clustering algorithms live outside this crate.
// The registry drives them through `MapSurface` and `Clusterer`; the
// headless implementations below record what they were told so the engine
// runs (and is testable) without a browser.

use crate::entities::InfoCard;
use crate::geo::{Bounds, LatLng};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque marker handle issued by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub u64);

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything the widget needs to create a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: LatLng,
    pub title: Option<String>,
    pub icon_url: String,
    pub info_card: Option<InfoCard>,
}

/// Radius filter overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterCircle {
    pub center: LatLng,
    pub radius_meters: f64,
}

/// Where the map is mounted and what it shows first.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub container: String,
    pub center: LatLng,
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            container: "map".to_string(),
            center: LatLng::new(0.0, 0.0),
            zoom: 1,
        }
    }
}

// ============================================================================
// CAPABILITY TRAITS
// ============================================================================

pub trait MapSurface {
    /// Create a marker attached to the map (visible).
    fn place_marker(&mut self, id: MarkerId, spec: &MarkerSpec);

    fn remove_marker(&mut self, id: MarkerId);

    /// Attach to / detach from the map surface.
    fn set_marker_visible(&mut self, id: MarkerId, visible: bool);

    fn set_marker_title(&mut self, id: MarkerId, title: Option<&str>);

    fn set_info_card(&mut self, id: MarkerId, card: Option<&InfoCard>);

    fn set_view(&mut self, center: LatLng, zoom: u8);

    fn fit_bounds(&mut self, bounds: &Bounds);

    fn set_bouncing(&mut self, id: MarkerId, bouncing: bool);

    fn show_circle(&mut self, circle: Option<&FilterCircle>);
}

pub trait Clusterer {
    fn add_marker(&mut self, id: MarkerId);

    fn remove_marker(&mut self, id: MarkerId);

    fn add_markers(&mut self, ids: &[MarkerId]);

    fn clear_markers(&mut self);
}

// ============================================================================
// HEADLESS MAP
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMarker {
    pub spec: MarkerSpec,
    pub attached: bool,
    pub bouncing: bool,
}

/// In-memory map surface.
#[derive(Debug, Clone)]
pub struct HeadlessMap {
    pub container: String,
    pub center: LatLng,
    pub zoom: u8,
    pub markers: HashMap<MarkerId, HeadlessMarker>,
    pub last_fit: Option<Bounds>,
    pub circle: Option<FilterCircle>,
}

impl HeadlessMap {
    /// Mount onto a container. An empty container id is a configuration
    /// error and nothing is created.
    pub fn mount(config: &MapConfig) -> Result<Self> {
        if config.container.trim().is_empty() {
            bail!("Map container id is empty");
        }

        Ok(HeadlessMap {
            container: config.container.clone(),
            center: config.center,
            zoom: config.zoom,
            markers: HashMap::new(),
            last_fit: None,
            circle: None,
        })
    }

    pub fn marker(&self, id: MarkerId) -> Option<&HeadlessMarker> {
        self.markers.get(&id)
    }

    pub fn attached_count(&self) -> usize {
        self.markers.values().filter(|m| m.attached).count()
    }
}

impl MapSurface for HeadlessMap {
    fn place_marker(&mut self, id: MarkerId, spec: &MarkerSpec) {
        self.markers.insert(
            id,
            HeadlessMarker {
                spec: spec.clone(),
                attached: true,
                bouncing: false,
            },
        );
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.markers.remove(&id);
    }

    fn set_marker_visible(&mut self, id: MarkerId, visible: bool) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.attached = visible;
        }
    }

    fn set_marker_title(&mut self, id: MarkerId, title: Option<&str>) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.spec.title = title.map(str::to_string);
        }
    }

    fn set_info_card(&mut self, id: MarkerId, card: Option<&InfoCard>) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.spec.info_card = card.cloned();
        }
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.center = center;
        self.zoom = zoom;
    }

    fn fit_bounds(&mut self, bounds: &Bounds) {
        self.center = bounds.center();
        self.last_fit = Some(*bounds);
    }

    fn set_bouncing(&mut self, id: MarkerId, bouncing: bool) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.bouncing = bouncing;
        }
    }

    fn show_circle(&mut self, circle: Option<&FilterCircle>) {
        self.circle = circle.copied();
    }
}

// ============================================================================
// HEADLESS CLUSTERER
// ============================================================================

/// Keeps the clustered membership and counts full rebuilds.
#[derive(Debug, Clone, Default)]
pub struct HeadlessClusterer {
    members: Vec<MarkerId>,
    pub clears: usize,
}

impl HeadlessClusterer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self) -> &[MarkerId] {
        &self.members
    }
}

impl Clusterer for HeadlessClusterer {
    fn add_marker(&mut self, id: MarkerId) {
        if !self.members.contains(&id) {
            self.members.push(id);
        }
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.members.retain(|m| *m != id);
    }

    fn add_markers(&mut self, ids: &[MarkerId]) {
        for id in ids {
            self.add_marker(*id);
        }
    }

    fn clear_markers(&mut self) {
        self.members.clear();
        self.clears += 1;
    }
}
