// Map Markers - Core Library
// Exposes all modules for use in the TUI, the API server, and tests

pub mod geo;            // Coordinates, haversine distance, bounds
pub mod entities;       // User / Company entity models
pub mod widget;         // Map surface + clusterer capabilities (headless impls)
pub mod events;         // Registry observers
pub mod registry;       // Marker registry - single source of truth
pub mod schema;         // Import batch validation
pub mod transfer;       // JSON / CSV / GeoJSON import + export
pub mod store;          // Persisted UI state (memory + SQLite)
pub mod geocode;        // Address search
pub mod controller;     // Operator actions wired to the registry
pub mod config;         // Environment configuration
pub mod logging;        // tracing subscriber setup

// Re-export commonly used types
pub use geo::{haversine_km, km_to_meters, meters_to_km, Bounds, LatLng, Location, EARTH_RADIUS_KM};
pub use entities::{Company, Entity, EntityKind, InfoCard, Mappable, User};
pub use widget::{
    Clusterer, FilterCircle, HeadlessClusterer, HeadlessMap, MapConfig, MapSurface, MarkerId,
    MarkerSpec,
};
pub use events::{MarkerAdded, MarkerRemoved, ObserverId, RegistryObserver};
pub use registry::{
    MarkerEdit, MarkerMeta, MarkerRecord, MarkerRegistry, MarkerSummary, MetaPatch,
    HIGHLIGHT_DURATION_MS,
};
pub use schema::{SchemaValidator, ValidationError, ValidationResult};
pub use transfer::{
    export_records, import_json, preview_import, ExportFormat, ExportRecord, ImportError,
    ImportOptions, ImportPreviewRow, ImportReport, ImportSkip, SkipReason,
};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use geocode::{GeocodeResult, Geocoder, StaticGeocoder};
pub use controller::{
    FilterForm, InputError, MapController, ProjectError, SearchError, Toggles,
};
pub use config::AppConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Controller over the headless map, as both binaries run it.
pub type HeadlessController = MapController<HeadlessMap, HeadlessClusterer>;

/// Mount the headless map, open the SQLite store and restore the saved UI
/// state (after seeding the demo markers when asked to).
pub fn build_controller(config: &AppConfig, seed_demo: bool) -> anyhow::Result<HeadlessController> {
    let surface = HeadlessMap::mount(&config.map)?;
    let registry = MarkerRegistry::new(surface, HeadlessClusterer::new());
    let store = SqliteStore::open(&config.db_path)?;

    let mut controller = MapController::new(registry, Box::new(store))
        .with_geocoder(Box::new(StaticGeocoder::with_defaults()))
        .with_import_options(config.import_options());
    if seed_demo {
        controller.seed_demo();
    }
    controller.restore_ui_state();

    tracing::info!(
        db = %config.db_path.display(),
        markers = controller.registry().len(),
        "Map controller ready"
    );
    Ok(controller)
}
