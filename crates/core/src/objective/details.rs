//! Per-category popup contents for objectives.
//!
//! Which attributes are shown for which category is a fixed table; the engine never looks at
//! these fields.

use crate::objective::{Category, Objective};

struct Field {
    label: &'static str,
    /// Tried in order, first displayable value wins
    keys: &'static [&'static str],
    link: bool,
}

const fn field(label: &'static str, keys: &'static [&'static str]) -> Field {
    Field {
        label,
        keys,
        link: false,
    }
}

const SHARED: &[Field] = &[
    field("Opening hours", &["opening_hours"]),
    field("Phone", &["phone", "contact:phone"]),
    Field {
        label: "Website",
        keys: &["website"],
        link: true,
    },
    field("Wheelchair", &["wheelchair"]),
];

const POST_OFFICE: &[Field] = &[
    field("Post Office Type", &["post_office:type"]),
    field("Brand", &["brand", "post_office:brand"]),
    field("Hermes Ref", &["ref:Hermes"]),
    field("Shop Type", &["shop"]),
];

const BAR: &[Field] = &[
    field("Indoor Seating", &["indoor_seating"]),
    field("Outdoor Seating", &["outdoor_seating"]),
    field("Start Date", &["start_date"]),
];

const PUB: &[Field] = &[
    field("Indoor Seating", &["indoor_seating"]),
    field("Outdoor Seating", &["outdoor_seating"]),
    field("Smoking", &["smoking"]),
    field("Toilets", &["toilets"]),
];

const RESTAURANT: &[Field] = &[field("Wheelchair Toilet", &["toilets:wheelchair"])];

const CAFE: &[Field] = &[
    field("Cuisine", &["cuisine"]),
    field("Vegan Options", &["diet:vegan"]),
    field("Internet Access", &["internet_access"]),
    field("Takeaway", &["takeaway"]),
];

const ADDRESS_KEYS: &[&str] = &["addr:street", "addr:housenumber", "addr:postcode", "addr:city"];

fn category_fields(category: Category) -> &'static [Field] {
    match category {
        Category::PostOffice => POST_OFFICE,
        Category::Bar => BAR,
        Category::Pub => PUB,
        Category::Restaurant => RESTAURANT,
        Category::Cafe => CAFE,
        Category::Other => &[],
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
    /// Value is a URL
    pub link: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectiveDetails {
    pub title: String,
    pub address: Option<String>,
    pub rows: Vec<DetailRow>,
}

pub fn details(objective: &Objective) -> ObjectiveDetails {
    let title = match objective.name() {
        Some(name) => name.to_owned(),
        None => format!(
            "Unnamed {}",
            objective.display_attribute(&["amenity"]).unwrap_or("unknown")
        ),
    };

    let address_parts: Vec<&str> = ADDRESS_KEYS
        .iter()
        .filter_map(|key| objective.display_attribute(&[*key]))
        .collect();
    let address = (!address_parts.is_empty()).then(|| address_parts.join(", "));

    let rows = SHARED
        .iter()
        .chain(category_fields(objective.category))
        .filter_map(|field| {
            objective.display_attribute(field.keys).map(|value| DetailRow {
                label: field.label,
                value: value.to_owned(),
                link: field.link,
            })
        })
        .collect();

    ObjectiveDetails {
        title,
        address,
        rows,
    }
}
