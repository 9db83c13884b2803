// Map Markers - Web Server
// JSON API over the map controller (axum)

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use map_markers::{
    build_controller, logging, AppConfig, Bounds, Entity, EntityKind, ExportFormat, ExportRecord,
    FilterCircle, FilterForm, HeadlessController, ImportError, InfoCard, ImportPreviewRow, ImportReport,
    LatLng, Location, MarkerEdit, MarkerId, ProjectError, SearchError, Toggles,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    controller: Arc<Mutex<HeadlessController>>,
}

impl AppState {
    fn new(controller: HeadlessController) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
        }
    }

    /// A panicked handler must not take the whole map down with it.
    fn lock(&self) -> MutexGuard<'_, HeadlessController> {
        self.controller.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// Error half of every handler: status + message in the usual envelope.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn no_marker(index: usize) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("No marker at index {}", index))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(status = %self.status, error = %self.message, "Request failed");
        let body = ApiResponse {
            success: false,
            data: serde_json::Value::Null,
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        let status = match err {
            SearchError::EmptyQuery => StatusCode::BAD_REQUEST,
            SearchError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            SearchError::NoResults => StatusCode::NOT_FOUND,
            SearchError::Service(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ProjectError> for ApiError {
    fn from(err: ProjectError) -> Self {
        let status = match err {
            ProjectError::NoSavedProject => StatusCode::NOT_FOUND,
            ProjectError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProjectError::Import(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self::new(status, err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = %err, "Internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

// ============================================================================
// Request / Response bodies
// ============================================================================

/// Marker row for the sidebar list
#[derive(Serialize)]
struct MarkerView {
    index: usize,
    #[serde(flatten)]
    record: ExportRecord,
}

#[derive(Deserialize)]
struct AddMarkerRequest {
    #[serde(rename = "type")]
    kind: EntityKind,
    name: Option<String>,
    position: Option<LatLng>,
}

#[derive(Serialize)]
struct AddedMarker {
    index: usize,
    id: MarkerId,
}

#[derive(Deserialize)]
struct VisibleRequest {
    visible: bool,
}

#[derive(Serialize)]
struct ZoomResponse {
    id: MarkerId,
    center: LatLng,
    zoom: u8,
}

#[derive(Serialize)]
struct CardResponse {
    card: InfoCard,
    html: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TogglesRequest {
    show_users: Option<bool>,
    show_companies: Option<bool>,
}

/// Form inputs arrive as numbers or as raw text.
#[derive(Deserialize)]
#[serde(untagged)]
enum FormValue {
    Number(f64),
    Text(String),
}

impl FormValue {
    fn into_text(self) -> String {
        match self {
            FormValue::Number(n) => n.to_string(),
            FormValue::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
struct FilterRequest {
    lat: Option<FormValue>,
    lng: Option<FormValue>,
    km: Option<FormValue>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CircleRequest {
    lat: Option<f64>,
    lng: Option<f64>,
    radius_km: Option<f64>,
}

#[derive(Serialize)]
struct CircleResponse {
    circle: FilterCircle,
    readout: String,
}

#[derive(Serialize)]
struct SavedProject {
    markers: usize,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/markers - Sidebar list
async fn list_markers(State(state): State<AppState>) -> ApiResult<Vec<MarkerView>> {
    let controller = state.lock();
    let views = map_markers::export_records(controller.registry())
        .into_iter()
        .enumerate()
        .map(|(index, record)| MarkerView { index, record })
        .collect();
    ok(views)
}

/// POST /api/markers - Add a user or company
async fn add_marker(
    State(state): State<AppState>,
    Json(req): Json<AddMarkerRequest>,
) -> ApiResult<AddedMarker> {
    let mut controller = state.lock();
    let entity = Entity::new(req.kind, req.name.as_deref(), req.position.map(Location::from));
    let id = controller.registry_mut().add_marker(&entity);
    let index = controller.registry().len() - 1;
    ok(AddedMarker { index, id })
}

/// DELETE /api/markers/:index
async fn delete_marker(State(state): State<AppState>, Path(index): Path<usize>) -> ApiResult<MarkerId> {
    let mut controller = state.lock();
    let id = controller
        .delete_marker(index)
        .ok_or_else(|| ApiError::no_marker(index))?;
    ok(id)
}

/// PUT /api/markers/:index - Marker editor save
async fn edit_marker(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(edit): Json<MarkerEdit>,
) -> ApiResult<bool> {
    let mut controller = state.lock();
    if !controller.edit_marker(index, edit) {
        return Err(ApiError::no_marker(index));
    }
    ok(true)
}

/// POST /api/markers/:index/visible
async fn set_visible(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(req): Json<VisibleRequest>,
) -> ApiResult<bool> {
    let mut controller = state.lock();
    if !controller.set_marker_visible(index, req.visible) {
        return Err(ApiError::no_marker(index));
    }
    ok(req.visible)
}

/// POST /api/markers/:index/zoom - Center + bounce highlight
async fn zoom_marker(State(state): State<AppState>, Path(index): Path<usize>) -> ApiResult<ZoomResponse> {
    let mut controller = state.lock();
    let id = controller
        .zoom_to(index, Utc::now())
        .ok_or_else(|| ApiError::no_marker(index))?;
    let surface = controller.registry().surface();
    ok(ZoomResponse {
        id,
        center: surface.center,
        zoom: surface.zoom,
    })
}

/// GET /api/markers/:index/card - Info card popup
async fn marker_card(State(state): State<AppState>, Path(index): Path<usize>) -> ApiResult<CardResponse> {
    let controller = state.lock();
    if controller.registry().marker_id_at(index).is_none() {
        return Err(ApiError::no_marker(index));
    }
    let card = controller.info_card(index).ok_or_else(|| {
        ApiError::new(StatusCode::NOT_FOUND, format!("Marker {} has no info card", index))
    })?;
    let html = card.render_html();
    ok(CardResponse { card, html })
}

/// POST /api/markers/:index/card/zoom - Info card "Zoom" action
async fn card_zoom(State(state): State<AppState>, Path(index): Path<usize>) -> ApiResult<ZoomResponse> {
    let mut controller = state.lock();
    let id = controller
        .zoom_close(index)
        .ok_or_else(|| ApiError::no_marker(index))?;
    let surface = controller.registry().surface();
    ok(ZoomResponse {
        id,
        center: surface.center,
        zoom: surface.zoom,
    })
}

/// POST /api/toggles - Users / companies checkboxes
async fn set_toggles(State(state): State<AppState>, Json(req): Json<TogglesRequest>) -> ApiResult<Toggles> {
    let mut controller = state.lock();
    if let Some(show) = req.show_users {
        controller.set_show_users(show);
    }
    if let Some(show) = req.show_companies {
        controller.set_show_companies(show);
    }
    ok(controller.toggles())
}

/// POST /api/fit - Fit view to visible markers
async fn fit(State(state): State<AppState>) -> ApiResult<Option<Bounds>> {
    let mut controller = state.lock();
    ok(controller.fit())
}

/// POST /api/filter - Distance filter form
async fn apply_filter(State(state): State<AppState>, Json(req): Json<FilterRequest>) -> ApiResult<usize> {
    let form = FilterForm {
        lat: req.lat.map(FormValue::into_text).unwrap_or_default(),
        lng: req.lng.map(FormValue::into_text).unwrap_or_default(),
        km: req.km.map(FormValue::into_text).unwrap_or_default(),
    };

    let mut controller = state.lock();
    controller
        .apply_filter_form(&form)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;
    ok(controller.registry().visible_count())
}

/// POST /api/circle - Place, move or resize the filter circle
async fn update_circle(State(state): State<AppState>, Json(req): Json<CircleRequest>) -> ApiResult<CircleResponse> {
    let mut controller = state.lock();

    let mut circle = match (req.lat, req.lng) {
        (Some(lat), Some(lng)) => {
            let center = LatLng::new(lat, lng);
            controller
                .move_circle(center)
                .or_else(|| Some(controller.place_circle(center)))
        }
        (None, None) => controller.filter_circle(),
        _ => return Err(ApiError::bad_request("lat and lng must be given together")),
    };

    if let Some(km) = req.radius_km {
        circle = controller.set_circle_radius_km(km);
    }

    let circle = circle.ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "No filter circle"))?;
    let readout = controller.circle_readout(false).unwrap_or_default();
    ok(CircleResponse { circle, readout })
}

/// DELETE /api/circle
async fn remove_circle(State(state): State<AppState>) -> ApiResult<bool> {
    let mut controller = state.lock();
    if !controller.remove_circle() {
        return Err(ApiError::new(StatusCode::NOT_FOUND, "No filter circle"));
    }
    ok(true)
}

/// POST /api/import - Body is the JSON array as text
async fn import_markers(State(state): State<AppState>, body: String) -> ApiResult<ImportReport> {
    let mut controller = state.lock();
    ok(controller.import(&body)?)
}

/// POST /api/import/preview - Dry run
async fn preview_import(State(state): State<AppState>, body: String) -> ApiResult<Vec<ImportPreviewRow>> {
    let controller = state.lock();
    ok(controller.preview_import(&body)?)
}

/// GET /api/export/:format - File download
async fn export_markers(
    State(state): State<AppState>,
    Path(format): Path<String>,
) -> Result<Response, ApiError> {
    let format: ExportFormat = format
        .parse()
        .map_err(|err: anyhow::Error| ApiError::bad_request(err.to_string()))?;
    let body = state.lock().export(format)?;

    let headers = [
        (header::CONTENT_TYPE, format.mime_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", format.file_name()),
        ),
    ];
    Ok((headers, body).into_response())
}

/// POST /api/project/save
async fn save_project(State(state): State<AppState>) -> ApiResult<SavedProject> {
    let markers = state.lock().save_project()?;
    ok(SavedProject { markers })
}

/// POST /api/project/load
async fn load_project(State(state): State<AppState>) -> ApiResult<ImportReport> {
    let report = state.lock().load_project()?;
    ok(report)
}

/// POST /api/search - Geocode and pin as a user
async fn search(State(state): State<AppState>, Json(req): Json<SearchRequest>) -> ApiResult<AddedMarker> {
    let mut controller = state.lock();
    let id = controller.search(&req.query)?;
    let index = controller.registry().len() - 1;
    ok(AddedMarker { index, id })
}

// ============================================================================
// Router
// ============================================================================

fn build_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/markers", get(list_markers).post(add_marker))
        .route("/markers/:index", put(edit_marker).delete(delete_marker))
        .route("/markers/:index/visible", post(set_visible))
        .route("/markers/:index/zoom", post(zoom_marker))
        .route("/markers/:index/card", get(marker_card))
        .route("/markers/:index/card/zoom", post(card_zoom))
        .route("/toggles", post(set_toggles))
        .route("/fit", post(fit))
        .route("/filter", post(apply_filter))
        .route("/circle", post(update_circle).delete(remove_circle))
        .route("/import", post(import_markers))
        .route("/import/preview", post(preview_import))
        .route("/export/:format", get(export_markers))
        .route("/project/save", post(save_project))
        .route("/project/load", post(load_project))
        .route("/search", post(search))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    logging::init(&config.log_filter);

    println!("🌐 Map Markers - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let controller = build_controller(&config, true)?;
    println!("✓ State database: {}", config.db_path.display());

    let state = AppState::new(controller);

    // Expire bounce highlights
    let ticker = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(200));
        loop {
            interval.tick().await;
            ticker.lock().tick(Utc::now());
        }
    });

    let app = build_app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("\n🚀 Server running on http://localhost:{}", config.port);
    println!("   API: http://localhost:{}/api/markers", config.port);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use map_markers::{
        HeadlessClusterer, HeadlessMap, MapConfig, MapController, MarkerRegistry, MemoryStore,
        StaticGeocoder,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let registry = MarkerRegistry::new(
            HeadlessMap::mount(&MapConfig::default()).unwrap(),
            HeadlessClusterer::new(),
        );
        let mut controller = MapController::new(registry, Box::new(MemoryStore::new()))
            .with_geocoder(Box::new(StaticGeocoder::with_defaults()));
        controller.seed_demo();
        AppState::new(controller)
    }

    async fn send(state: &AppState, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let resp = build_app(state.clone())
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state();
        let (status, body) = send(&state, "GET", "/api/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_list_and_add_markers() {
        let state = test_state();
        let (status, body) = send(
            &state,
            "POST",
            "/api/markers",
            r#"{"type":"Company","name":"Globex","position":{"lat":10.5,"lng":-20.0}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["index"], 2);

        let (_, body) = send(&state, "GET", "/api/markers", "").await;
        let markers = body["data"].as_array().unwrap();
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0]["title"], "John Doe");
        assert_eq!(markers[2]["type"], "Company");
        assert_eq!(markers[2]["position"]["lat"], 10.5);
        assert_eq!(markers[2]["index"], 2);
    }

    #[tokio::test]
    async fn test_delete_unknown_index() {
        let state = test_state();
        let (status, body) = send(&state, "DELETE", "/api/markers/7", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "No marker at index 7");

        let (status, _) = send(&state, "DELETE", "/api/markers/0", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.lock().registry().len(), 1);
    }

    #[tokio::test]
    async fn test_toggles_and_visibility() {
        let state = test_state();
        let (_, body) = send(&state, "POST", "/api/toggles", r#"{"showCompanies":false}"#).await;
        assert_eq!(body["data"]["showCompanies"], false);
        assert_eq!(body["data"]["showUsers"], true);

        let (status, _) = send(&state, "POST", "/api/markers/0/visible", r#"{"visible":false}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.lock().registry().visible_count(), 0);
    }

    #[tokio::test]
    async fn test_filter_accepts_text_and_numbers() {
        let state = test_state();
        let (status, body) =
            send(&state, "POST", "/api/filter", r#"{"lat":"45","lng":45,"km":"10"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], 0);

        let (status, body) = send(&state, "POST", "/api/filter", r#"{"km":"lots"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("km"));
    }

    #[tokio::test]
    async fn test_circle_endpoints() {
        let state = test_state();
        let (status, _) = send(&state, "POST", "/api/circle", r#"{"radiusKm":5}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            send(&state, "POST", "/api/circle", r#"{"lat":0,"lng":0,"radiusKm":0}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["circle"]["radius_meters"], 100.0);
        assert_eq!(body["data"]["readout"], "0.1 km");

        let (status, _) = send(&state, "DELETE", "/api/circle", "").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&state, "DELETE", "/api/circle", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_import_and_export() {
        let state = test_state();
        let (status, body) = send(
            &state,
            "POST",
            "/api/import",
            r#"[{"type":"User","title":"Alice","position":{"lat":1.23,"lng":4.56}},{"type":"Robot"}]"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["imported"], 1);
        assert_eq!(body["data"]["total"], 2);

        let (status, body) = send(&state, "POST", "/api/import", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Imported file must be a JSON array");

        let resp = build_app(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/api/export/geojson")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/geo+json"
        );
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let geojson: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(geojson["features"].as_array().unwrap().len(), 3);

        let (status, _) = send(&state, "GET", "/api/export/xml", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_project_round_trip() {
        let state = test_state();
        let (status, _) = send(&state, "POST", "/api/project/load", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&state, "POST", "/api/project/save", "").await;
        assert_eq!(body["data"]["markers"], 2);

        let (status, body) = send(&state, "POST", "/api/project/load", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["imported"], 2);
        assert_eq!(state.lock().registry().len(), 4);
    }

    #[tokio::test]
    async fn test_search() {
        let state = test_state();
        let (status, body) = send(&state, "POST", "/api/search", r#"{"query":"Nairobi"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["index"], 2);

        let (status, body) = send(&state, "POST", "/api/search", r#"{"query":"Atlantis"}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No results found");
    }

    #[tokio::test]
    async fn test_zoom() {
        let state = test_state();
        let (status, body) = send(&state, "POST", "/api/markers/1/zoom", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["zoom"], 14);
    }

    #[tokio::test]
    async fn test_fit() {
        let state = test_state();
        send(
            &state,
            "POST",
            "/api/markers",
            r#"{"type":"User","name":"North","position":{"lat":40.0,"lng":10.0}}"#,
        )
        .await;

        let (status, body) = send(&state, "POST", "/api/fit", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["south"], 0.0);
        assert_eq!(body["data"]["north"], 40.0);
        assert_eq!(body["data"]["east"], 10.0);

        send(&state, "POST", "/api/toggles", r#"{"showUsers":false,"showCompanies":false}"#).await;
        let (status, body) = send(&state, "POST", "/api/fit", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_info_card() {
        let state = test_state();
        let (status, body) = send(&state, "GET", "/api/markers/0/card", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["card"]["title"], "John Doe");
        assert!(body["data"]["html"].as_str().unwrap().contains("John Doe"));

        let (status, _) = send(&state, "GET", "/api/markers/9/card", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&state, "POST", "/api/markers/1/card/zoom", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["zoom"], 12);
    }
}
