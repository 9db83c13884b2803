// Synthetic placeholder data for entities created without explicit fields

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bruno", "Chloe", "Dmitri", "Elena", "Farid", "Grace", "Hiro", "Ines", "Jonas",
    "Keira", "Luca", "Maya", "Nikolai", "Olga", "Pedro", "Quinn", "Rosa", "Sven", "Tariq",
];

const COMPANY_STEMS: &[&str] = &[
    "Acme", "Globex", "Initech", "Umbrella", "Stark", "Wayne", "Hooli", "Vandelay", "Soylent",
    "Tyrell", "Cyberdyne", "Wonka",
];

const COMPANY_SUFFIXES: &[&str] = &["Inc", "LLC", "Group", "and Sons", "Ltd", "Partners"];

const STREETS: &[&str] = &[
    "Main St", "Oak Ave", "Maple Rd", "Cedar Ln", "Elm St", "Harbor Blvd", "Park Way",
    "Sunset Dr", "River Rd", "Hill St",
];

const CITIES: &[&str] = &[
    "Springfield", "Riverton", "Lakeside", "Fairview", "Georgetown", "Ashland", "Clinton",
    "Madison", "Franklin", "Salem",
];

fn pick(items: &[&'static str]) -> &'static str {
    items[rand::random_range(0..items.len())]
}

/// Four decimal places, like a printed coordinate.
fn coordinate(max: f64) -> f64 {
    let raw: f64 = rand::random_range(-max..=max);
    (raw * 10_000.0).round() / 10_000.0
}

pub fn first_name() -> String {
    pick(FIRST_NAMES).to_string()
}

pub fn company_name() -> String {
    format!("{} {}", pick(COMPANY_STEMS), pick(COMPANY_SUFFIXES))
}

pub fn latitude() -> f64 {
    coordinate(90.0)
}

pub fn longitude() -> f64 {
    coordinate(180.0)
}

/// `"<number> <street>, <city>"`
pub fn street_address() -> String {
    let number: u32 = rand::random_range(1..10_000);
    format!("{} {}, {}", number, pick(STREETS), pick(CITIES))
}

/// Avatar service URL seeded by the entity name.
pub fn avatar_url(name: &str) -> String {
    format!("https://i.pravatar.cc/150?u={}", urlencoding::encode(name))
}
