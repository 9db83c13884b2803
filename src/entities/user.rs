// 👤 User Entity - a person pinned on the map

use super::{placeholder, read_record, record_value, EntityKind, InfoCard, Mappable};
use crate::geo::Location;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub name: String,
    pub location: Location,
    pub address: String,
    pub avatar_url: String,
}

impl User {
    /// Create a user, filling whatever is missing with placeholder data.
    pub fn new(name: Option<&str>, location: Option<Location>) -> Self {
        let name = name
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(placeholder::first_name);
        let location = location.unwrap_or_else(|| {
            Location::new(placeholder::latitude(), placeholder::longitude())
        });
        let avatar_url = placeholder::avatar_url(&name);

        User {
            name,
            location,
            address: placeholder::street_address(),
            avatar_url,
        }
    }

    /// Rehydrate from a serialized record; never fails.
    ///
    /// Missing name becomes `"User"`, missing location `{0, 0}`; present
    /// `location.lat`, `location.long`, `address` and `avatarUrl` are overlaid.
    pub fn from_json(value: &Value) -> Self {
        let fields = read_record(value, "User");
        let mut user = User::new(Some(&fields.name), Some(fields.location));
        if let Some(address) = fields.address {
            user.address = address;
        }
        if let Some(avatar_url) = fields.avatar_url {
            user.avatar_url = avatar_url;
        }
        user
    }

    pub fn to_record(&self) -> Value {
        record_value(&self.name, self.location, &self.address, &self.avatar_url)
    }
}

impl Mappable for User {
    fn kind(&self) -> EntityKind {
        EntityKind::User
    }

    fn location(&self) -> Location {
        self.location
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn marker_content(&self) -> Option<InfoCard> {
        Some(InfoCard::full(
            &self.name,
            &self.address,
            &self.avatar_url,
            self.location,
        ))
    }

    fn address(&self) -> Option<&str> {
        Some(&self.address)
    }

    fn avatar_url(&self) -> Option<&str> {
        Some(&self.avatar_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_with_explicit_fields() {
        let user = User::new(Some("John Doe"), Some(Location::new(0.0, 0.0)));

        assert_eq!(user.name, "John Doe");
        assert_eq!(user.location, Location::new(0.0, 0.0));
        assert!(!user.address.is_empty());
        assert_eq!(user.avatar_url, "https://i.pravatar.cc/150?u=John%20Doe");
    }

    #[test]
    fn test_user_placeholders() {
        let user = User::new(None, None);

        assert!(!user.name.is_empty());
        assert!((-90.0..=90.0).contains(&user.location.lat));
        assert!((-180.0..=180.0).contains(&user.location.long));
        assert!(user.address.contains(", "));
    }

    #[test]
    fn test_empty_name_gets_placeholder() {
        let user = User::new(Some(""), None);
        assert!(!user.name.is_empty());
    }

    #[test]
    fn test_from_json_rehydrates() {
        let record = json!({
            "name": "Alice",
            "location": { "lat": 1.23, "long": 4.56 },
            "address": "123 Main St",
            "avatarUrl": "https://example.com/a.png",
        });
        let user = User::from_json(&record);

        assert_eq!(user.name, "Alice");
        assert_eq!(user.location, Location::new(1.23, 4.56));
        assert_eq!(user.address, "123 Main St");
        assert_eq!(user.avatar_url, "https://example.com/a.png");
    }

    #[test]
    fn test_from_json_defaults() {
        let user = User::from_json(&json!({}));

        assert_eq!(user.name, "User");
        assert_eq!(user.location, Location::new(0.0, 0.0));
        assert_eq!(user.avatar_url, "https://i.pravatar.cc/150?u=User");
    }

    #[test]
    fn test_from_json_ignores_non_numeric_lat() {
        let user = User::from_json(&json!({ "location": { "lat": "1.5", "long": 2.5 } }));
        assert_eq!(user.location, Location::new(0.0, 2.5));
    }

    #[test]
    fn test_record_round_trip() {
        let original = User::new(None, None);
        let restored = User::from_json(&original.to_record());

        assert_eq!(restored.name, original.name);
        assert_eq!(restored.address, original.address);
        assert_eq!(restored.avatar_url, original.avatar_url);
        assert!((restored.location.lat - original.location.lat).abs() < 1e-12);
        assert!((restored.location.long - original.location.long).abs() < 1e-12);
    }

    #[test]
    fn test_marker_content_uses_current_fields() {
        let mut user = User::new(Some("Bob"), Some(Location::new(10.0, 20.0)));
        user.address = "1 Elm St".to_string();
        let card = user.marker_content().unwrap();

        assert_eq!(card.title, "Bob");
        assert_eq!(card.address.as_deref(), Some("1 Elm St"));
        assert_eq!(card.coordinates_label().as_deref(), Some("(10.000, 20.000)"));
    }
}
