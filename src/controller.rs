// 🎛️ Map Controller - operator actions wired to the registry
//
// Front ends (TUI, HTTP) only talk to this type. It owns:
// - the marker registry
// - the persisted UI state store
// - the optional geocoder used by search
// - the filter circle tool
//
// Store writes are best-effort: a failure is logged and the action still
// takes effect on the map.

use crate::entities::{Company, Entity, EntityKind, InfoCard, Mappable, User};
use crate::geo::{km_to_meters, meters_to_km, Bounds, LatLng, Location};
use crate::geocode::Geocoder;
use crate::registry::{MarkerEdit, MarkerRegistry, MarkerSummary, MetaPatch};
use crate::store::{self, KeyValueStore, KEY_SHOW_COMPANIES, KEY_SHOW_USERS};
use crate::transfer::{
    self, ExportFormat, ImportError, ImportOptions, ImportPreviewRow, ImportReport,
};
use crate::widget::{Clusterer, FilterCircle, MapSurface, MarkerId};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Radius of a freshly placed filter circle.
pub const DEFAULT_CIRCLE_RADIUS_METERS: f64 = 100_000.0;

/// Smallest radius the slider can produce.
pub const MIN_CIRCLE_RADIUS_KM: f64 = 0.1;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    EmptyQuery,
    /// No geocoder configured
    Unavailable,
    NoResults,
    Service(String),
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::EmptyQuery => write!(f, "Search query is empty"),
            SearchError::Unavailable => write!(f, "Geocoding not available"),
            SearchError::NoResults => write!(f, "No results found"),
            SearchError::Service(reason) => write!(f, "Geocoding failed: {}", reason),
        }
    }
}

impl std::error::Error for SearchError {}

/// A form field that should hold a number but doesn't.
#[derive(Debug, Clone, PartialEq)]
pub struct InputError {
    pub field: &'static str,
    pub value: String,
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid number for {}: {:?}", self.field, self.value)
    }
}

impl std::error::Error for InputError {}

#[derive(Debug)]
pub enum ProjectError {
    NoSavedProject,
    Storage(anyhow::Error),
    Import(ImportError),
}

impl std::fmt::Display for ProjectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectError::NoSavedProject => write!(f, "No saved project found"),
            ProjectError::Storage(err) => write!(f, "Failed to load project: {}", err),
            ProjectError::Import(err) => write!(f, "Failed to load project: {}", err),
        }
    }
}

impl std::error::Error for ProjectError {}

/// Parse a numeric form field. Blank reads as 0.
pub fn parse_number(field: &'static str, raw: &str) -> Result<f64, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| InputError {
            field,
            value: raw.to_string(),
        })
}

/// Raw text of the distance filter form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FilterForm {
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub lng: String,
    #[serde(default)]
    pub km: String,
}

/// Toggle state as shown by the sidebar checkboxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toggles {
    pub show_users: bool,
    pub show_companies: bool,
}

// ============================================================================
// MAP CONTROLLER
// ============================================================================

pub struct MapController<S: MapSurface, C: Clusterer> {
    registry: MarkerRegistry<S, C>,
    store: Box<dyn KeyValueStore>,
    geocoder: Option<Box<dyn Geocoder>>,
    import_options: ImportOptions,
    toggles: Toggles,
    circle: Option<FilterCircle>,
}

impl<S: MapSurface, C: Clusterer> MapController<S, C> {
    pub fn new(registry: MarkerRegistry<S, C>, store: Box<dyn KeyValueStore>) -> Self {
        MapController {
            registry,
            store,
            geocoder: None,
            import_options: ImportOptions::default(),
            toggles: Toggles {
                show_users: true,
                show_companies: true,
            },
            circle: None,
        }
    }

    pub fn with_geocoder(mut self, geocoder: Box<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_import_options(mut self, options: ImportOptions) -> Self {
        self.import_options = options;
        self
    }

    /// The two markers every fresh map starts with.
    pub fn seed_demo(&mut self) {
        let origin = Location::new(0.0, 0.0);
        self.registry.add_marker(&User::new(Some("John Doe"), Some(origin)));
        self.registry.add_marker(&Company::new(Some("Acme Corp"), Some(origin)));
    }

    /// Re-apply persisted toggles and the saved filter circle.
    pub fn restore_ui_state(&mut self) {
        match store::load_toggle(self.store.as_ref(), KEY_SHOW_USERS) {
            Ok(Some(show)) => {
                self.toggles.show_users = show;
                self.registry.show_users(show);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "Failed to read users toggle"),
        }

        match store::load_toggle(self.store.as_ref(), KEY_SHOW_COMPANIES) {
            Ok(Some(show)) => {
                self.toggles.show_companies = show;
                self.registry.show_companies(show);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "Failed to read companies toggle"),
        }

        match store::load_filter_circle(self.store.as_ref()) {
            Ok(Some(circle)) => {
                tracing::debug!(radius = circle.radius_meters, "Restoring filter circle");
                self.install_circle(circle);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "Ignoring saved filter circle"),
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn registry(&self) -> &MarkerRegistry<S, C> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MarkerRegistry<S, C> {
        &mut self.registry
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn toggles(&self) -> Toggles {
        self.toggles
    }

    pub fn filter_circle(&self) -> Option<FilterCircle> {
        self.circle
    }

    pub fn import_options(&self) -> ImportOptions {
        self.import_options
    }

    pub fn markers(&self) -> Vec<MarkerSummary> {
        self.registry.get_markers()
    }

    // ========================================================================
    // SIDEBAR ACTIONS
    // ========================================================================

    pub fn set_show_users(&mut self, show: bool) {
        self.toggles.show_users = show;
        self.persist("users toggle", |s| store::save_toggle(s, KEY_SHOW_USERS, show));
        self.registry.show_users(show);
    }

    pub fn set_show_companies(&mut self, show: bool) {
        self.toggles.show_companies = show;
        self.persist("companies toggle", |s| store::save_toggle(s, KEY_SHOW_COMPANIES, show));
        self.registry.show_companies(show);
    }

    pub fn delete_marker(&mut self, index: usize) -> Option<MarkerId> {
        let removed = self.registry.remove_marker_at(index);
        if let Some(id) = removed {
            tracing::info!(marker = %id, index, "Deleted marker");
        }
        removed
    }

    pub fn set_marker_visible(&mut self, index: usize, visible: bool) -> bool {
        match self.registry.marker_id_at(index) {
            Some(id) => self.registry.set_marker_visible(id, visible),
            None => false,
        }
    }

    pub fn zoom_to(&mut self, index: usize, now: DateTime<Utc>) -> Option<MarkerId> {
        self.registry.zoom_to_marker(index, now)
    }

    /// Info card "Zoom" action for the marker at `index`.
    pub fn zoom_close(&mut self, index: usize) -> Option<MarkerId> {
        let id = self.registry.marker_id_at(index)?;
        self.registry.zoom_to_marker_close(id).then_some(id)
    }

    pub fn info_card(&self, index: usize) -> Option<InfoCard> {
        let id = self.registry.marker_id_at(index)?;
        self.registry.info_card(id).cloned()
    }

    /// Stop highlights that are due. Front ends call this from their tick.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<MarkerId> {
        self.registry.clear_expired_highlights(now)
    }

    pub fn fit(&mut self) -> Option<Bounds> {
        self.registry.fit_to_visible()
    }

    pub fn edit_marker(&mut self, index: usize, edit: MarkerEdit) -> bool {
        match self.registry.marker_id_at(index) {
            Some(id) => self.registry.edit_marker(id, edit),
            None => false,
        }
    }

    pub fn apply_filter(&mut self, center: Location, radius_km: f64) {
        self.registry.filter_by_distance(center, radius_km);
    }

    /// Distance filter from raw form text.
    pub fn apply_filter_form(&mut self, form: &FilterForm) -> Result<(), InputError> {
        let lat = parse_number("lat", &form.lat)?;
        let lng = parse_number("lng", &form.lng)?;
        let km = parse_number("km", &form.km)?;
        self.apply_filter(Location::new(lat, lng), km);
        Ok(())
    }

    // ========================================================================
    // IMPORT / EXPORT / PROJECT
    // ========================================================================

    pub fn export(&self, format: ExportFormat) -> Result<String> {
        transfer::export(&self.registry, format)
    }

    pub fn import(&mut self, text: &str) -> Result<ImportReport, ImportError> {
        let options = self.import_options;
        match transfer::import_json(&mut self.registry, text, &options) {
            Ok(report) => {
                tracing::info!(
                    imported = report.imported,
                    total = report.total,
                    skipped = report.failures(),
                    "Import finished"
                );
                Ok(report)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Import rejected");
                Err(err)
            }
        }
    }

    pub fn preview_import(&self, text: &str) -> Result<Vec<ImportPreviewRow>, ImportError> {
        transfer::preview_import(text, &self.import_options)
    }

    /// Snapshot every marker into `map.lastExport`. Returns the marker count.
    pub fn save_project(&mut self) -> Result<usize> {
        let records = transfer::export_records(&self.registry);
        let json = serde_json::to_string(&records)?;
        store::save_last_export(self.store.as_mut(), &json)?;
        tracing::info!(markers = records.len(), saved_at = %Utc::now(), "Project saved");
        Ok(records.len())
    }

    /// Re-add the markers saved by `save_project`. Existing markers stay.
    pub fn load_project(&mut self) -> Result<ImportReport, ProjectError> {
        let raw = store::load_last_export(self.store.as_ref())
            .map_err(ProjectError::Storage)?
            .ok_or(ProjectError::NoSavedProject)?;
        let options = self.import_options;
        let report = transfer::import_json(&mut self.registry, &raw, &options)
            .map_err(ProjectError::Import)?;
        tracing::info!(imported = report.imported, total = report.total, "Project loaded");
        Ok(report)
    }

    // ========================================================================
    // SEARCH
    // ========================================================================

    /// Geocode `query` and pin the best match as a user marker named after
    /// the query.
    pub fn search(&mut self, query: &str) -> Result<MarkerId, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let geocoder = self.geocoder.as_ref().ok_or(SearchError::Unavailable)?;

        let results = geocoder.geocode(query).map_err(|err| {
            tracing::warn!(query, error = %err, "Geocoder failed");
            SearchError::Service(err.to_string())
        })?;
        let best = results.into_iter().next().ok_or(SearchError::NoResults)?;

        let user = Entity::new(EntityKind::User, Some(query), Some(Location::from(best.position)));
        let id = self.registry.add_marker(&user);
        self.registry.set_marker_meta(
            id,
            MetaPatch {
                address: Some(best.formatted_address.clone()),
                avatar_url: user.avatar_url().map(str::to_string),
            },
        );
        tracing::info!(query, address = %best.formatted_address, marker = %id, "Search result pinned");
        Ok(id)
    }

    // ========================================================================
    // FILTER CIRCLE
    // ========================================================================

    /// Place (or replace) the filter circle at `center` with the default radius.
    pub fn place_circle(&mut self, center: LatLng) -> FilterCircle {
        let circle = FilterCircle {
            center,
            radius_meters: DEFAULT_CIRCLE_RADIUS_METERS,
        };
        self.install_circle(circle);
        self.persist_circle();
        circle
    }

    /// Slider input in km, clamped to `MIN_CIRCLE_RADIUS_KM`.
    pub fn set_circle_radius_km(&mut self, km: f64) -> Option<FilterCircle> {
        let mut circle = self.circle?;
        circle.radius_meters = km_to_meters(km.max(MIN_CIRCLE_RADIUS_KM));
        self.install_circle(circle);
        self.persist_circle();
        Some(circle)
    }

    pub fn set_circle_radius_input(&mut self, raw: &str) -> Result<Option<FilterCircle>, InputError> {
        let km = parse_number("radius", raw)?;
        Ok(self.set_circle_radius_km(km))
    }

    /// Dragging the circle.
    pub fn move_circle(&mut self, center: LatLng) -> Option<FilterCircle> {
        let mut circle = self.circle?;
        circle.center = center;
        self.install_circle(circle);
        self.persist_circle();
        Some(circle)
    }

    /// Drop the circle and show every marker again.
    pub fn remove_circle(&mut self) -> bool {
        if self.circle.take().is_none() {
            return false;
        }
        self.registry.surface_mut().show_circle(None);
        self.persist("filter circle", store::clear_filter_circle);
        self.registry.show_users(true);
        self.registry.show_companies(true);
        true
    }

    /// Radius readout: one decimal km, or whole meters.
    pub fn circle_readout(&self, in_meters: bool) -> Option<String> {
        let radius = self.circle?.radius_meters;
        Some(if in_meters {
            format!("{} m", radius.round())
        } else {
            format!("{} km", (radius / 100.0).round() / 10.0)
        })
    }

    fn install_circle(&mut self, circle: FilterCircle) {
        self.circle = Some(circle);
        self.registry.surface_mut().show_circle(Some(&circle));
        self.registry
            .filter_by_distance(Location::from(circle.center), meters_to_km(circle.radius_meters));
    }

    fn persist_circle(&mut self) {
        if let Some(circle) = self.circle {
            self.persist("filter circle", |s| store::save_filter_circle(s, &circle));
        }
    }

    fn persist<F>(&mut self, what: &str, write: F)
    where
        F: FnOnce(&mut dyn KeyValueStore) -> Result<()>,
    {
        if let Err(err) = write(self.store.as_mut()) {
            tracing::warn!(error = %err, "Failed to persist {}", what);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::{GeocodeResult, StaticGeocoder};
    use crate::store::{MemoryStore, KEY_FILTER_CIRCLE, KEY_LAST_EXPORT};
    use crate::widget::{HeadlessClusterer, HeadlessMap, MapConfig};
    use anyhow::bail;
    use chrono::Duration;

    type TestController = MapController<HeadlessMap, HeadlessClusterer>;

    fn controller_with(store: MemoryStore) -> TestController {
        let registry = MarkerRegistry::new(
            HeadlessMap::mount(&MapConfig::default()).unwrap(),
            HeadlessClusterer::new(),
        );
        MapController::new(registry, Box::new(store))
    }

    fn controller() -> TestController {
        controller_with(MemoryStore::new())
    }

    fn visible_titles(ctl: &TestController) -> Vec<String> {
        ctl.markers()
            .into_iter()
            .filter(|m| m.visible)
            .filter_map(|m| m.title)
            .collect()
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            bail!("disk on fire")
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            bail!("disk on fire")
        }
        fn remove(&mut self, _key: &str) -> Result<()> {
            bail!("disk on fire")
        }
    }

    struct BrokenGeocoder;

    impl Geocoder for BrokenGeocoder {
        fn geocode(&self, _query: &str) -> Result<Vec<GeocodeResult>> {
            bail!("quota exceeded")
        }
    }

    #[test]
    fn test_seed_demo() {
        let mut ctl = controller();
        ctl.seed_demo();

        let markers = ctl.markers();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].title.as_deref(), Some("John Doe"));
        assert_eq!(markers[1].title.as_deref(), Some("Acme Corp"));
        assert_eq!(markers[0].position, LatLng::new(0.0, 0.0));
        assert_eq!(ctl.registry().user_markers().len(), 1);
        assert_eq!(ctl.registry().company_markers().len(), 1);
    }

    #[test]
    fn test_toggles_persist_and_restore() {
        let mut ctl = controller();
        ctl.seed_demo();
        ctl.set_show_users(false);

        assert_eq!(visible_titles(&ctl), vec!["Acme Corp"]);
        assert_eq!(ctl.store().get(KEY_SHOW_USERS).unwrap().as_deref(), Some("false"));

        let mut saved = MemoryStore::new();
        saved.set(KEY_SHOW_USERS, "false").unwrap();
        saved.set(KEY_SHOW_COMPANIES, "true").unwrap();

        let mut restored = controller_with(saved);
        restored.seed_demo();
        restored.restore_ui_state();

        assert_eq!(
            restored.toggles(),
            Toggles {
                show_users: false,
                show_companies: true
            }
        );
        assert_eq!(visible_titles(&restored), vec!["Acme Corp"]);
    }

    #[test]
    fn test_store_failure_does_not_block_toggle() {
        let registry = MarkerRegistry::new(
            HeadlessMap::mount(&MapConfig::default()).unwrap(),
            HeadlessClusterer::new(),
        );
        let mut ctl = MapController::new(registry, Box::new(FailingStore));
        ctl.seed_demo();

        ctl.set_show_companies(false);
        ctl.restore_ui_state();

        assert_eq!(visible_titles(&ctl), vec!["John Doe"]);
        assert!(!ctl.toggles().show_companies);
    }

    #[test]
    fn test_delete_and_visibility_by_index() {
        let mut ctl = controller();
        ctl.seed_demo();

        assert!(ctl.set_marker_visible(1, false));
        assert!(!ctl.set_marker_visible(5, false));
        assert_eq!(visible_titles(&ctl), vec!["John Doe"]);

        assert!(ctl.delete_marker(0).is_some());
        assert!(ctl.delete_marker(3).is_none());
        assert_eq!(ctl.markers().len(), 1);
        assert_eq!(ctl.markers()[0].title.as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn test_zoom_and_tick() {
        let mut ctl = controller();
        ctl.seed_demo();
        let now = Utc::now();

        let id = ctl.zoom_to(1, now).unwrap();
        assert!(ctl.tick(now + Duration::milliseconds(1399)).is_empty());
        assert_eq!(ctl.tick(now + Duration::milliseconds(1400)), vec![id]);
        assert!(ctl.zoom_to(9, now).is_none());
    }

    #[test]
    fn test_info_card_zoom_action() {
        let mut ctl = controller();
        ctl.seed_demo();
        ctl.registry_mut()
            .add_marker(&Company::new(Some("Harbor"), Some(Location::new(51.5, -0.1))));

        let id = ctl.zoom_close(2).unwrap();
        let surface = ctl.registry().surface();
        assert_eq!(surface.center, LatLng::new(51.5, -0.1));
        assert_eq!(surface.zoom, 12);
        assert!(!ctl.registry().is_highlighted(id));
        assert!(ctl.zoom_close(3).is_none());
    }

    #[test]
    fn test_info_card_follows_edits() {
        let mut ctl = controller();
        ctl.seed_demo();

        let card = ctl.info_card(0).unwrap();
        assert_eq!(card.title, "John Doe");
        assert!(!card.is_title_only());
        assert!(card.render_html().contains("John Doe"));

        ctl.edit_marker(
            0,
            MarkerEdit {
                title: "Jane Roe".to_string(),
                address: "9 Elm St".to_string(),
                avatar_url: String::new(),
            },
        );
        let card = ctl.info_card(0).unwrap();
        assert_eq!(card.title, "Jane Roe");
        assert_eq!(card.address.as_deref(), Some("9 Elm St"));
        assert!(ctl.info_card(7).is_none());
    }

    #[test]
    fn test_edit_marker_by_index() {
        let mut ctl = controller();
        ctl.seed_demo();

        let edit = MarkerEdit {
            title: String::new(),
            address: "1 Infinite Loop".to_string(),
            avatar_url: String::new(),
        };
        assert!(ctl.edit_marker(1, edit));

        let id = ctl.registry().marker_id_at(1).unwrap();
        let meta = ctl.registry().get_marker_meta(id).unwrap();
        assert_eq!(meta.address.as_deref(), Some("1 Infinite Loop"));
        assert_eq!(meta.kind, EntityKind::Company);
        assert_eq!(ctl.markers()[1].title.as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn test_filter_form() {
        let mut ctl = controller();
        ctl.seed_demo();
        ctl.registry_mut()
            .add_marker(&User::new(Some("Far"), Some(Location::new(45.0, 45.0))));

        let form = FilterForm {
            lat: "0".to_string(),
            lng: "".to_string(),
            km: " 100 ".to_string(),
        };
        ctl.apply_filter_form(&form).unwrap();
        assert_eq!(visible_titles(&ctl), vec!["John Doe", "Acme Corp"]);

        let bad = FilterForm {
            km: "ten".to_string(),
            ..FilterForm::default()
        };
        let err = ctl.apply_filter_form(&bad).unwrap_err();
        assert_eq!(err.field, "km");
        assert_eq!(visible_titles(&ctl), vec!["John Doe", "Acme Corp"]);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("lat", "  ").unwrap(), 0.0);
        assert_eq!(parse_number("lat", "-12.5").unwrap(), -12.5);
        assert!(parse_number("lat", "NaN").is_err());
        assert!(parse_number("lat", "1,5").is_err());
    }

    #[test]
    fn test_save_and_load_project() {
        let mut ctl = controller();
        ctl.seed_demo();

        assert_eq!(ctl.save_project().unwrap(), 2);
        let saved = ctl.store().get(KEY_LAST_EXPORT).unwrap().unwrap();
        assert!(saved.contains("\"John Doe\""));

        let report = ctl.load_project().unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(ctl.markers().len(), 4);
        assert_eq!(ctl.markers()[2].title.as_deref(), Some("John Doe"));
    }

    #[test]
    fn test_load_project_without_save() {
        let mut ctl = controller();
        let err = ctl.load_project().unwrap_err();
        assert!(matches!(err, ProjectError::NoSavedProject));
        assert_eq!(err.to_string(), "No saved project found");
    }

    #[test]
    fn test_import_through_controller() {
        let mut ctl = controller();
        let report = ctl
            .import(r#"[{"type":"Company","title":"Initech","position":{"lat":30.0,"lng":-97.0}}]"#)
            .unwrap();
        assert_eq!(report.imported, 1);

        let csv = ctl.export(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("title,lat,lng,type,address,avatarUrl"));
        assert!(csv.contains("Initech,30.0,-97.0,Company"));

        assert!(ctl.import("not json").is_err());
        assert_eq!(ctl.markers().len(), 1);
    }

    #[test]
    fn test_search_adds_user_with_formatted_address() {
        let mut ctl = controller().with_geocoder(Box::new(StaticGeocoder::with_defaults()));
        let id = ctl.search("  paris ").unwrap();

        let record = ctl.registry().get(id).unwrap();
        assert_eq!(record.kind, EntityKind::User);
        assert_eq!(record.title.as_deref(), Some("paris"));
        assert_eq!(record.position, LatLng::new(48.8566, 2.3522));

        let meta = ctl.registry().get_marker_meta(id).unwrap();
        assert_eq!(meta.address.as_deref(), Some("Paris, France"));
        assert_eq!(
            meta.avatar_url.as_deref(),
            Some("https://i.pravatar.cc/150?u=paris")
        );
    }

    #[test]
    fn test_search_failures_leave_map_untouched() {
        let mut ctl = controller();
        assert_eq!(ctl.search("   ").unwrap_err(), SearchError::EmptyQuery);
        assert_eq!(ctl.search("paris").unwrap_err(), SearchError::Unavailable);

        let mut ctl = ctl.with_geocoder(Box::new(StaticGeocoder::with_defaults()));
        assert_eq!(ctl.search("Atlantis").unwrap_err(), SearchError::NoResults);

        let mut ctl = ctl.with_geocoder(Box::new(BrokenGeocoder));
        let err = ctl.search("paris").unwrap_err();
        assert_eq!(err.to_string(), "Geocoding failed: quota exceeded");

        assert!(ctl.markers().is_empty());
    }

    #[test]
    fn test_filter_circle_lifecycle() {
        let mut ctl = controller();
        ctl.seed_demo();
        ctl.registry_mut()
            .add_marker(&Company::new(Some("Far"), Some(Location::new(10.0, 10.0))));

        let circle = ctl.place_circle(LatLng::new(0.0, 0.0));
        assert_eq!(circle.radius_meters, 100_000.0);
        assert_eq!(ctl.registry().surface().circle, Some(circle));
        assert_eq!(visible_titles(&ctl), vec!["John Doe", "Acme Corp"]);
        assert!(ctl.store().get(KEY_FILTER_CIRCLE).unwrap().is_some());

        let moved = ctl.move_circle(LatLng::new(10.0, 10.0)).unwrap();
        assert_eq!(moved.center, LatLng::new(10.0, 10.0));
        assert_eq!(visible_titles(&ctl), vec!["Far"]);

        assert!(ctl.remove_circle());
        assert!(!ctl.remove_circle());
        assert_eq!(ctl.registry().surface().circle, None);
        assert_eq!(ctl.store().get(KEY_FILTER_CIRCLE).unwrap(), None);
        assert_eq!(visible_titles(&ctl).len(), 3);
    }

    #[test]
    fn test_circle_radius_clamps() {
        let mut ctl = controller();
        assert!(ctl.set_circle_radius_km(5.0).is_none());

        ctl.place_circle(LatLng::new(0.0, 0.0));
        let circle = ctl.set_circle_radius_km(0.0).unwrap();
        assert_eq!(circle.radius_meters, 100.0);

        let circle = ctl.set_circle_radius_input("12.5").unwrap().unwrap();
        assert_eq!(circle.radius_meters, 12_500.0);
        assert_eq!(ctl.circle_readout(false).as_deref(), Some("12.5 km"));
        assert_eq!(ctl.circle_readout(true).as_deref(), Some("12500 m"));

        assert!(ctl.set_circle_radius_input("wide").is_err());
    }

    #[test]
    fn test_filter_circle_restores() {
        let mut saved = MemoryStore::new();
        saved
            .set(KEY_FILTER_CIRCLE, r#"{"lat":10.0,"lng":10.0,"radius":50000}"#)
            .unwrap();

        let mut ctl = controller_with(saved);
        ctl.seed_demo();
        ctl.restore_ui_state();

        let circle = ctl.filter_circle().unwrap();
        assert_eq!(circle.center, LatLng::new(10.0, 10.0));
        assert_eq!(circle.radius_meters, 50_000.0);
        assert!(visible_titles(&ctl).is_empty());
    }
}
