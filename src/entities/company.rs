// 🏢 Company Entity - an organisation pinned on the map

use super::{placeholder, read_record, record_value, EntityKind, InfoCard, Mappable};
use crate::geo::Location;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Company {
    pub name: String,
    pub location: Location,
    pub address: String,
    pub avatar_url: String,
}

impl Company {
    pub fn new(name: Option<&str>, location: Option<Location>) -> Self {
        let name = name
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(placeholder::company_name);
        let location = location.unwrap_or_else(|| {
            Location::new(placeholder::latitude(), placeholder::longitude())
        });
        let avatar_url = placeholder::avatar_url(&name);

        Company {
            name,
            location,
            address: placeholder::street_address(),
            avatar_url,
        }
    }

    /// Same rules as `User::from_json`, with `"Company"` as the default name.
    pub fn from_json(value: &Value) -> Self {
        let fields = read_record(value, "Company");
        let mut company = Company::new(Some(&fields.name), Some(fields.location));
        if let Some(address) = fields.address {
            company.address = address;
        }
        if let Some(avatar_url) = fields.avatar_url {
            company.avatar_url = avatar_url;
        }
        company
    }

    pub fn to_record(&self) -> Value {
        record_value(&self.name, self.location, &self.address, &self.avatar_url)
    }
}

impl Mappable for Company {
    fn kind(&self) -> EntityKind {
        EntityKind::Company
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
