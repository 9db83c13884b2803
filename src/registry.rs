// 📍 Marker Registry - single source of truth for markers on the map
//
// Owns:
// - the marker list (insertion order)
// - a metadata side table keyed by MarkerId
// - the user / company subsets (fixed at insertion)
// - the map surface and the clusterer it keeps in sync
//
// Invariants:
// - every marker in the list has exactly one metadata entry
// - every marker belongs to exactly one subset, chosen by its kind

use crate::entities::{EntityKind, InfoCard, Mappable};
use crate::events::{MarkerAdded, MarkerRemoved, ObserverId, Observers, RegistryObserver};
use crate::geo::{haversine_km, Bounds, LatLng, Location};
use crate::widget::{Clusterer, MapSurface, MarkerId, MarkerSpec};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How long the zoom highlight (bounce) lasts.
pub const HIGHLIGHT_DURATION_MS: i64 = 1400;

/// Zoom level used by the sidebar "Zoom" button.
pub const MARKER_ZOOM: u8 = 14;

/// Zoom level used by the info card "Zoom" action.
pub const INFO_CARD_ZOOM: u8 = 12;

// ============================================================================
// RECORDS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRecord {
    pub id: MarkerId,
    pub position: LatLng,
    pub title: Option<String>,
    pub visible: bool,
    pub kind: EntityKind,
}

/// Metadata side entry. `kind` is fixed at insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: EntityKind,
}

/// Shallow-merge update: `Some` fields overwrite, `None` fields are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaPatch {
    pub address: Option<String>,
    pub avatar_url: Option<String>,
}

/// Operator edit from the marker editor.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerEdit {
    /// Empty keeps the current title.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// Read-only projection used by the sidebar list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSummary {
    pub index: usize,
    pub position: LatLng,
    pub title: Option<String>,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy)]
struct Highlight {
    id: MarkerId,
    until: DateTime<Utc>,
}

// ============================================================================
// MARKER REGISTRY
// ============================================================================

pub struct MarkerRegistry<S: MapSurface, C: Clusterer> {
    surface: S,
    clusterer: C,
    /// Set once the first marker triggered a full cluster build
    cluster_started: bool,

    order: Vec<MarkerId>,
    records: HashMap<MarkerId, MarkerRecord>,
    meta: HashMap<MarkerId, MarkerMeta>,
    /// Popup currently attached to each marker (absent for unnamed markers)
    cards: HashMap<MarkerId, InfoCard>,
    users: Vec<MarkerId>,
    companies: Vec<MarkerId>,

    next_id: u64,
    highlights: Vec<Highlight>,
    observers: Observers,
}

impl<S: MapSurface, C: Clusterer> MarkerRegistry<S, C> {
    pub fn new(surface: S, clusterer: C) -> Self {
        MarkerRegistry {
            surface,
            clusterer,
            cluster_started: false,
            order: Vec::new(),
            records: HashMap::new(),
            meta: HashMap::new(),
            cards: HashMap::new(),
            users: Vec::new(),
            companies: Vec::new(),
            next_id: 0,
            highlights: Vec::new(),
            observers: Observers::default(),
        }
    }

    // ========================================================================
    // INSERTION / REMOVAL
    // ========================================================================

    /// Place a marker for `entity` and start tracking it.
    pub fn add_marker<M: Mappable + ?Sized>(&mut self, entity: &M) -> MarkerId {
        self.next_id += 1;
        let id = MarkerId(self.next_id);
        let kind = entity.kind();
        let position = LatLng::from(entity.location());
        let title = entity.name().map(str::to_string);

        let info_card = entity
            .marker_content()
            .or_else(|| entity.name().map(InfoCard::title_only));

        if let Some(card) = &info_card {
            self.cards.insert(id, card.clone());
        }
        self.surface.place_marker(
            id,
            &MarkerSpec {
                position,
                title: title.clone(),
                icon_url: kind.icon_url().to_string(),
                info_card,
            },
        );

        self.order.push(id);
        self.records.insert(
            id,
            MarkerRecord {
                id,
                position,
                title: title.clone(),
                visible: true,
                kind,
            },
        );
        self.meta.insert(
            id,
            MarkerMeta {
                address: entity.address().map(str::to_string),
                avatar_url: entity.avatar_url().map(str::to_string),
                kind,
            },
        );
        match kind {
            EntityKind::User => self.users.push(id),
            EntityKind::Company => self.companies.push(id),
        }

        if self.cluster_started {
            self.clusterer.add_marker(id);
        } else {
            self.clusterer.clear_markers();
            self.clusterer.add_markers(&self.order);
            self.cluster_started = true;
        }

        let event = MarkerAdded {
            id,
            index: self.order.len() - 1,
            kind,
            title,
            position,
        };
        self.observers.emit_added(&event);

        id
    }

    /// Delete a marker. Unknown ids are ignored.
    pub fn remove_marker(&mut self, id: MarkerId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };

        self.order.remove(index);
        let record = self.records.remove(&id);
        self.meta.remove(&id);
        self.cards.remove(&id);
        self.users.retain(|m| *m != id);
        self.companies.retain(|m| *m != id);
        self.highlights.retain(|h| h.id != id);

        // Remaining markers keep their visibility, no rebuild needed
        self.surface.remove_marker(id);
        self.clusterer.remove_marker(id);

        if let Some(record) = record {
            self.observers.emit_removed(&MarkerRemoved {
                id,
                index,
                kind: record.kind,
            });
        }

        true
    }

    /// Delete the marker at `index` in insertion order.
    pub fn remove_marker_at(&mut self, index: usize) -> Option<MarkerId> {
        let id = self.marker_id_at(index)?;
        self.remove_marker(id);
        Some(id)
    }

    /// Remove every marker.
    pub fn clear(&mut self) {
        while let Some(&id) = self.order.last() {
            self.remove_marker(id);
        }
    }

    // ========================================================================
    // METADATA
    // ========================================================================

    pub fn set_marker_meta(&mut self, id: MarkerId, patch: MetaPatch) -> bool {
        let Some(meta) = self.meta.get_mut(&id) else {
            return false;
        };
        if let Some(address) = patch.address {
            meta.address = Some(address);
        }
        if let Some(avatar_url) = patch.avatar_url {
            meta.avatar_url = Some(avatar_url);
        }
        true
    }

    pub fn get_marker_meta(&self, id: MarkerId) -> Option<&MarkerMeta> {
        self.meta.get(&id)
    }

    /// Apply an operator edit and refresh the marker's info card.
    pub fn edit_marker(&mut self, id: MarkerId, edit: MarkerEdit) -> bool {
        let Some(record) = self.records.get_mut(&id) else {
            return false;
        };

        if !edit.title.is_empty() {
            record.title = Some(edit.title);
        }
        let title = record.title.clone().unwrap_or_default();
        let position = record.position;

        let address = Some(edit.address).filter(|s| !s.is_empty());
        let avatar_url = Some(edit.avatar_url).filter(|s| !s.is_empty());
        if let Some(meta) = self.meta.get_mut(&id) {
            meta.address = address.clone();
            meta.avatar_url = avatar_url.clone();
        }

        let card = InfoCard::full(
            &title,
            address.as_deref().unwrap_or(""),
            avatar_url.as_deref().unwrap_or(""),
            Location::from(position),
        );
        self.surface.set_marker_title(id, Some(&title));
        self.surface.set_info_card(id, Some(&card));
        self.cards.insert(id, card);

        true
    }

    // ========================================================================
    // VISIBILITY
    // ========================================================================

    pub fn set_marker_visible(&mut self, id: MarkerId, visible: bool) -> bool {
        if !self.apply_visibility(id, visible) {
            return false;
        }
        self.refresh_cluster();
        true
    }

    pub fn show_users(&mut self, show: bool) {
        let ids = self.users.clone();
        for id in ids {
            self.apply_visibility(id, show);
        }
        self.refresh_cluster();
    }

    pub fn show_companies(&mut self, show: bool) {
        let ids = self.companies.clone();
        for id in ids {
            self.apply_visibility(id, show);
        }
        self.refresh_cluster();
    }

    /// Visible ⇔ great-circle distance from `center` ≤ `radius_km`.
    pub fn filter_by_distance(&mut self, center: Location, radius_km: f64) {
        let decisions: Vec<(MarkerId, bool)> = self
            .order
            .iter()
            .filter_map(|id| self.records.get(id))
            .map(|r| (r.id, haversine_km(center, Location::from(r.position)) <= radius_km))
            .collect();

        for (id, visible) in decisions {
            self.apply_visibility(id, visible);
        }
        self.refresh_cluster();
    }

    /// Rebuild the cluster view from every visible marker.
    pub(crate) fn refresh_cluster(&mut self) {
        if !self.cluster_started {
            return;
        }
        let visible: Vec<MarkerId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.records.get(id).is_some_and(|r| r.visible))
            .collect();

        self.clusterer.clear_markers();
        self.clusterer.add_markers(&visible);
    }

    fn apply_visibility(&mut self, id: MarkerId, visible: bool) -> bool {
        let Some(record) = self.records.get_mut(&id) else {
            return false;
        };
        record.visible = visible;
        self.surface.set_marker_visible(id, visible);
        true
    }

    // ========================================================================
    // VIEW
    // ========================================================================

    /// Fit the view to every visible marker. No-op when none is visible.
    pub fn fit_to_visible(&mut self) -> Option<Bounds> {
        let bounds = Bounds::covering(
            self.order
                .iter()
                .filter_map(|id| self.records.get(id))
                .filter(|r| r.visible)
                .map(|r| r.position),
        )?;
        self.surface.fit_bounds(&bounds);
        Some(bounds)
    }

    /// Center on the marker at `index` and highlight it until
    /// `now + HIGHLIGHT_DURATION_MS`. Out of range is a no-op.
    pub fn zoom_to_marker(&mut self, index: usize, now: DateTime<Utc>) -> Option<MarkerId> {
        let id = self.marker_id_at(index)?;
        let position = self.records.get(&id)?.position;

        self.surface.set_view(position, MARKER_ZOOM);
        self.surface.set_bouncing(id, true);

        let until = now + Duration::milliseconds(HIGHLIGHT_DURATION_MS);
        self.highlights.retain(|h| h.id != id);
        self.highlights.push(Highlight { id, until });

        Some(id)
    }

    /// Info card "Zoom" action.
    pub fn zoom_to_marker_close(&mut self, id: MarkerId) -> bool {
        let Some(record) = self.records.get(&id) else {
            return false;
        };
        let position = record.position;
        self.surface.set_view(position, INFO_CARD_ZOOM);
        true
    }

    /// Stop every highlight whose deadline has passed. Returns the markers
    /// that stopped bouncing.
    pub fn clear_expired_highlights(&mut self, now: DateTime<Utc>) -> Vec<MarkerId> {
        let (expired, live): (Vec<Highlight>, Vec<Highlight>) =
            self.highlights.iter().copied().partition(|h| h.until <= now);
        self.highlights = live;

        for h in &expired {
            self.surface.set_bouncing(h.id, false);
        }
        expired.into_iter().map(|h| h.id).collect()
    }

    pub fn is_highlighted(&self, id: MarkerId) -> bool {
        self.highlights.iter().any(|h| h.id == id)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn get_markers(&self) -> Vec<MarkerSummary> {
        self.records_in_order()
            .enumerate()
            .map(|(index, r)| MarkerSummary {
                index,
                position: r.position,
                title: r.title.clone(),
                visible: r.visible,
            })
            .collect()
    }

    /// Markers in insertion order.
    pub fn records_in_order(&self) -> impl Iterator<Item = &MarkerRecord> + '_ {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// The popup attached to a marker.
    pub fn info_card(&self, id: MarkerId) -> Option<&InfoCard> {
        self.cards.get(&id)
    }

    pub fn get(&self, id: MarkerId) -> Option<&MarkerRecord> {
        self.records.get(&id)
    }

    pub fn marker_id_at(&self, index: usize) -> Option<MarkerId> {
        self.order.get(index).copied()
    }

    pub fn index_of(&self, id: MarkerId) -> Option<usize> {
        self.order.iter().position(|m| *m == id)
    }

    pub fn user_markers(&self) -> &[MarkerId] {
        &self.users
    }

    pub fn company_markers(&self) -> &[MarkerId] {
        &self.companies
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn visible_count(&self) -> usize {
        self.records.values().filter(|r| r.visible).count()
    }

    // ========================================================================
    // OBSERVERS & COLLABORATORS
    // ========================================================================

    pub fn subscribe(&mut self, observer: Box<dyn RegistryObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn clusterer(&self) -> &C {
        &self.clusterer
    }
}

// ============================================================================
// TESTS
// ============================================================================
