// Entity Models - the things that end up as pins on the map
//
// Each entity has:
// - An explicit kind (User / Company) fixed at construction
// - A location plus display data (name, address, avatar)
// - A rehydration path from loosely-shaped JSON that never fails

pub mod company;
pub mod placeholder;
pub mod user;

pub use company::Company;
pub use user::User;

use crate::geo::Location;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// ENTITY KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Company,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::Company => "Company",
        }
    }

    /// Exact, case-sensitive match on the serialized tag.
    pub fn parse(s: &str) -> Option<EntityKind> {
        match s {
            "User" => Some(EntityKind::User),
            "Company" => Some(EntityKind::Company),
            _ => None,
        }
    }

    /// Marker icon for this kind.
    pub fn icon_url(&self) -> &'static str {
        match self {
            EntityKind::User => "http://maps.google.com/mapfiles/ms/icons/blue-dot.png",
            EntityKind::Company => "http://maps.google.com/mapfiles/ms/icons/red-dot.png",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// MAPPABLE CAPABILITY
// ============================================================================

/// Anything the registry can turn into a marker.
pub trait Mappable {
    fn kind(&self) -> EntityKind;

    fn location(&self) -> Location;

    fn name(&self) -> Option<&str> {
        None
    }

    /// Entity-provided info card. The registry falls back to a name-only card.
    fn marker_content(&self) -> Option<InfoCard> {
        None
    }

    fn address(&self) -> Option<&str> {
        None
    }

    fn avatar_url(&self) -> Option<&str> {
        None
    }
}

// ============================================================================
// INFO CARD
// ============================================================================

/// Popup content attached to a marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoCard {
    pub title: String,
    pub address: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<Location>,
}

impl InfoCard {
    /// Full card layout: avatar, name, address, coordinates, zoom action.
    pub fn full(title: &str, address: &str, avatar_url: &str, location: Location) -> Self {
        InfoCard {
            title: title.to_string(),
            address: Some(address.to_string()),
            avatar_url: Some(avatar_url.to_string()),
            location: Some(location),
        }
    }

    pub fn title_only(title: &str) -> Self {
        InfoCard {
            title: title.to_string(),
            address: None,
            avatar_url: None,
            location: None,
        }
    }

    pub fn is_title_only(&self) -> bool {
        self.address.is_none() && self.avatar_url.is_none() && self.location.is_none()
    }

    /// Coordinates as shown on the card, e.g. `(1.230, 4.560)`.
    pub fn coordinates_label(&self) -> Option<String> {
        self.location
            .map(|loc| format!("({:.3}, {:.3})", loc.lat, loc.long))
    }

    pub fn render_html(&self) -> String {
        if self.is_title_only() {
            return format!("<div><strong>{}</strong></div>", escape_html(&self.title));
        }

        format!(
            "<div class=\"info-card\">\
             <div class=\"info-avatar\" style=\"background-image:url('{}'); background-size:cover\"></div>\
             <div class=\"info-body\"><strong>{}</strong><div>{}</div><div>{}</div>\
             <div class=\"info-actions\"><button data-action=\"zoom\">Zoom</button></div></div></div>",
            escape_html(self.avatar_url.as_deref().unwrap_or("")),
            escape_html(&self.title),
            escape_html(self.address.as_deref().unwrap_or("")),
            self.coordinates_label().unwrap_or_default(),
        )
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// ENTITY (either kind)
// ============================================================================

/// A `User` or a `Company`, for callers that pick the kind at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    User(User),
    Company(Company),
}

impl Entity {
    pub fn new(kind: EntityKind, name: Option<&str>, location: Option<Location>) -> Self {
        match kind {
            EntityKind::User => Entity::User(User::new(name, location)),
            EntityKind::Company => Entity::Company(Company::new(name, location)),
        }
    }

    pub fn from_json(kind: EntityKind, value: &Value) -> Self {
        match kind {
            EntityKind::User => Entity::User(User::from_json(value)),
            EntityKind::Company => Entity::Company(Company::from_json(value)),
        }
    }

    pub fn to_record(&self) -> Value {
        match self {
            Entity::User(u) => u.to_record(),
            Entity::Company(c) => c.to_record(),
        }
    }

    fn inner(&self) -> &dyn Mappable {
        match self {
            Entity::User(u) => u,
            Entity::Company(c) => c,
        }
    }
}

impl Mappable for Entity {
    fn kind(&self) -> EntityKind {
        self.inner().kind()
    }

    fn location(&self) -> Location {
        self.inner().location()
    }

    fn name(&self) -> Option<&str> {
        self.inner().name()
    }

    fn marker_content(&self) -> Option<InfoCard> {
        self.inner().marker_content()
    }

    fn address(&self) -> Option<&str> {
        self.inner().address()
    }

    fn avatar_url(&self) -> Option<&str> {
        self.inner().avatar_url()
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Loosely-typed fields pulled out of a serialized entity record.
///
/// Wrong-shaped fields (non-numeric lat, non-string address...) are dropped.
pub(crate) struct RecordFields {
    pub name: String,
    pub location: Location,
    pub address: Option<String>,
    pub avatar_url: Option<String>,
}

pub(crate) fn read_record(value: &Value, default_name: &str) -> RecordFields {
    let name = non_empty_str(value.get("name"))
        .unwrap_or(default_name)
        .to_string();

    let mut location = Location::default();
    if let Some(loc) = value.get("location") {
        if let Some(lat) = loc.get("lat").and_then(Value::as_f64) {
            location.lat = lat;
        }
        if let Some(long) = loc.get("long").and_then(Value::as_f64) {
            location.long = long;
        }
    }

    RecordFields {
        name,
        location,
        address: non_empty_str(value.get("address")).map(str::to_string),
        avatar_url: non_empty_str(value.get("avatarUrl")).map(str::to_string),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

pub(crate) fn record_value(name: &str, location: Location, address: &str, avatar_url: &str) -> Value {
    serde_json::json!({
        "name": name,
        "location": { "lat": location.lat, "long": location.long },
        "address": address,
        "avatarUrl": avatar_url,
    })
}
