// 📦 Import / Export - marker collections as JSON, CSV and GeoJSON
//
// Export reads the registry snapshot plus metadata.
// Import is all-or-nothing on structure (parse + schema) and
// skip-and-count on content (unknown entity types).

use crate::entities::{Entity, EntityKind, Mappable};
use crate::geo::LatLng;
use crate::registry::{MarkerRegistry, MetaPatch};
use crate::schema::{SchemaValidator, ValidationError};
use crate::widget::{Clusterer, MapSurface};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

// ============================================================================
// FORMATS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    GeoJson,
}

impl ExportFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "markers.json",
            ExportFormat::Csv => "markers.csv",
            ExportFormat::GeoJson => "markers.geojson",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::GeoJson => "application/geo+json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "geojson" => Ok(ExportFormat::GeoJson),
            other => Err(anyhow!("Unknown export format: {} (expected json, csv or geojson)", other)),
        }
    }
}

// ============================================================================
// EXPORT
// ============================================================================

/// One exported marker. Same shape as an import element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<LatLng>,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Flat CSV row: `title,lat,lng,type,address,avatarUrl`.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    title: Option<&'a str>,
    lat: Option<f64>,
    lng: Option<f64>,
    #[serde(rename = "type")]
    kind: EntityKind,
    address: Option<&'a str>,
    #[serde(rename = "avatarUrl")]
    avatar_url: Option<&'a str>,
}

pub fn export_records<S: MapSurface, C: Clusterer>(registry: &MarkerRegistry<S, C>) -> Vec<ExportRecord> {
    registry
        .records_in_order()
        .map(|record| {
            let meta = registry.get_marker_meta(record.id);
            ExportRecord {
                kind: meta.map(|m| m.kind).unwrap_or(record.kind),
                title: record.title.clone(),
                position: Some(record.position),
                visible: record.visible,
                address: meta.and_then(|m| m.address.clone()),
                avatar_url: meta.and_then(|m| m.avatar_url.clone()),
            }
        })
        .collect()
}

pub fn to_json(records: &[ExportRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("Failed to serialize markers to JSON")
}

/// Header comes from the first row; no rows → empty string.
pub fn to_csv(records: &[ExportRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for record in records {
        writer.serialize(CsvRow {
            title: record.title.as_deref(),
            lat: record.position.map(|p| p.lat),
            lng: record.position.map(|p| p.lng),
            kind: record.kind,
            address: record.address.as_deref(),
            avatar_url: record.avatar_url.as_deref(),
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV writer: {}", e))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// `FeatureCollection` of `Point` features, coordinates `[lng, lat]`.
pub fn to_geojson(records: &[ExportRecord]) -> Result<String> {
    let features: Vec<Value> = records
        .iter()
        .map(|record| {
            let mut properties = serde_json::Map::new();
            if let Some(title) = &record.title {
                properties.insert("title".to_string(), json!(title));
            }
            if let Some(address) = &record.address {
                properties.insert("address".to_string(), json!(address));
            }
            if let Some(avatar_url) = &record.avatar_url {
                properties.insert("avatarUrl".to_string(), json!(avatar_url));
            }
            properties.insert("type".to_string(), json!(record.kind));

            let geometry = record
                .position
                .map(|p| json!({ "type": "Point", "coordinates": [p.lng, p.lat] }))
                .unwrap_or(Value::Null);

            json!({
                "type": "Feature",
                "properties": properties,
                "geometry": geometry,
            })
        })
        .collect();

    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    serde_json::to_string_pretty(&collection).context("Failed to serialize GeoJSON")
}

pub fn export<S: MapSurface, C: Clusterer>(registry: &MarkerRegistry<S, C>, format: ExportFormat) -> Result<String> {
    let records = export_records(registry);
    match format {
        ExportFormat::Json => to_json(&records),
        ExportFormat::Csv => to_csv(&records),
        ExportFormat::GeoJson => to_geojson(&records),
    }
}

// ============================================================================
// IMPORT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Run the schema check before touching the registry.
    pub validate: bool,
    /// How many violations end up in the error message.
    pub max_reported_errors: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            validate: true,
            max_reported_errors: 3,
        }
    }
}

/// Batch-level failure. The registry is untouched when one of these is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportError {
    MalformedJson(String),
    NotAnArray,
    Validation {
        /// First `max_reported_errors` violations
        errors: Vec<ValidationError>,
        total: usize,
    },
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::MalformedJson(reason) => write!(f, "Invalid JSON file: {}", reason),
            ImportError::NotAnArray => write!(f, "Imported file must be a JSON array"),
            ImportError::Validation { errors, .. } => {
                let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                write!(f, "Validation failed: {}", messages.join("; "))
            }
        }
    }
}

impl std::error::Error for ImportError {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "value", rename_all = "camelCase")]
pub enum SkipReason {
    MissingType,
    UnknownType(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSkip {
    pub index: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub total: usize,
    pub skipped: Vec<ImportSkip>,
}

impl ImportReport {
    pub fn failures(&self) -> usize {
        self.skipped.len()
    }

    pub fn summary(&self) -> String {
        format!("Imported {} / {}", self.imported, self.total)
    }
}

/// Dry-run listing of what an import would add.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportPreviewRow {
    pub index: usize,
    pub kind: Option<String>,
    pub title: Option<String>,
    pub position: LatLng,
}

impl std::fmt::Display for ImportPreviewRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}. {} - {} ({}, {})",
            self.index + 1,
            self.kind.as_deref().unwrap_or("?"),
            self.title.as_deref().unwrap_or(""),
            self.position.lat,
            self.position.lng
        )
    }
}

/// Parse and (optionally) validate an import batch.
pub fn parse_batch(text: &str, options: &ImportOptions) -> Result<Vec<Value>, ImportError> {
    let parsed: Value =
        serde_json::from_str(text).map_err(|e| ImportError::MalformedJson(e.to_string()))?;
    let Value::Array(items) = parsed else {
        return Err(ImportError::NotAnArray);
    };

    if options.validate {
        if let Err(mut errors) = SchemaValidator::new().validate_batch(&items) {
            let total = errors.len();
            errors.truncate(options.max_reported_errors);
            return Err(ImportError::Validation { errors, total });
        }
    }

    Ok(items)
}

fn item_position(item: &Value) -> LatLng {
    let axis = |name: &str| {
        item.get("position")
            .and_then(|p| p.get(name))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    };
    LatLng::new(axis("lat"), axis("lng"))
}

/// Rebuild the entity an import element describes.
pub fn entity_from_item(item: &Value) -> Result<Entity, SkipReason> {
    let tag = item
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or(SkipReason::MissingType)?;
    let kind = EntityKind::parse(tag).ok_or_else(|| SkipReason::UnknownType(tag.to_string()))?;

    let position = item_position(item);
    let record = json!({
        "name": item.get("title"),
        "location": { "lat": position.lat, "long": position.lng },
        "address": item.get("address"),
        "avatarUrl": item.get("avatarUrl"),
    });

    Ok(Entity::from_json(kind, &record))
}

/// Import a JSON batch into the registry.
pub fn import_json<S: MapSurface, C: Clusterer>(
    registry: &mut MarkerRegistry<S, C>,
    text: &str,
    options: &ImportOptions,
) -> Result<ImportReport, ImportError> {
    let items = parse_batch(text, options)?;
    let mut report = ImportReport {
        total: items.len(),
        ..ImportReport::default()
    };

    for (index, item) in items.iter().enumerate() {
        match entity_from_item(item) {
            Ok(entity) => {
                let id = registry.add_marker(&entity);
                registry.set_marker_meta(
                    id,
                    MetaPatch {
                        address: entity.address().map(str::to_string),
                        avatar_url: entity.avatar_url().map(str::to_string),
                    },
                );
                report.imported += 1;
            }
            Err(reason) => {
                tracing::warn!(index, ?reason, "Skipping import item");
                report.skipped.push(ImportSkip { index, reason });
            }
        }
    }

    Ok(report)
}

pub fn preview_import(text: &str, options: &ImportOptions) -> Result<Vec<ImportPreviewRow>, ImportError> {
    let items = parse_batch(text, options)?;
    Ok(items
        .iter()
        .enumerate()
        .map(|(index, item)| ImportPreviewRow {
            index,
            kind: item.get("type").and_then(Value::as_str).map(str::to_string),
            title: item.get("title").and_then(Value::as_str).map(str::to_string),
            position: item_position(item),
        })
        .collect())
}

// ============================================================================
// TESTS
// ============================================================================
