//! Objectives: the points of interest a player has to reach.

pub mod details;

use std::collections::BTreeMap;

use geojson::{Feature, feature::Id};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
    identifiers::ObjectiveId,
    position::{Coordinate, objective_key},
};

/// Amenity kinds a game can be played with.
///
/// Names match the `amenity` tag of the geodata source.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Bar,
    Cafe,
    PostOffice,
    Pub,
    Restaurant,
    Other,
}

impl Category {
    /// Unknown or missing amenity values fall back to [`Category::Other`].
    pub fn from_amenity(amenity: Option<&str>) -> Self {
        amenity
            .and_then(|a| a.trim().parse().ok())
            .unwrap_or(Category::Other)
    }
}

/// A single attribute of a feature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Flag(bool),
    Null,
}

impl AttributeValue {
    /// Text shown to a player, if the value carries any information.
    pub fn display(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) if !s.trim().is_empty() => Some(s.as_str()),
            AttributeValue::Flag(true) => Some("yes"),
            _ => None,
        }
    }
}

impl From<&serde_json::Value> for AttributeValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttributeValue::Null,
            serde_json::Value::Bool(b) => AttributeValue::Flag(*b),
            serde_json::Value::String(s) => AttributeValue::Text(s.clone()),
            // numbers, arrays and objects keep their JSON text
            other => AttributeValue::Text(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Objective {
    pub id: ObjectiveId,
    pub category: Category,
    pub position: Coordinate,
    pub attributes: BTreeMap<String, AttributeValue>,
    /// Identifier assigned by the geodata source, if it sent one
    pub external_id: Option<String>,
}

impl Objective {
    pub fn new(
        category: Category,
        position: Coordinate,
        attributes: BTreeMap<String, AttributeValue>,
    ) -> Self {
        Self {
            id: objective_key(position),
            category,
            position,
            attributes,
            external_id: None,
        }
    }

    /// Convert a GeoJSON feature. Features without a usable point geometry yield `None`.
    pub fn from_feature(feature: &Feature) -> Option<Self> {
        let geometry = feature.geometry.as_ref()?;
        let position = match &geometry.value {
            geojson::Value::Point(coords) => {
                // GeoJSON orders positions lon, lat
                let lon = *coords.first()?;
                let lat = *coords.get(1)?;
                Coordinate::new(lat, lon)
            }
            _ => return None,
        };

        if !position.is_finite() {
            return None;
        }

        let attributes: BTreeMap<String, AttributeValue> = feature
            .properties
            .iter()
            .flatten()
            .map(|(key, value)| (key.clone(), AttributeValue::from(value)))
            .collect();

        let category = Category::from_amenity(match attributes.get("amenity") {
            Some(AttributeValue::Text(amenity)) => Some(amenity.as_str()),
            _ => None,
        });

        let external_id = feature.id.as_ref().map(|id| match id {
            Id::String(s) => s.clone(),
            Id::Number(n) => n.to_string(),
        });

        Some(Self {
            external_id,
            ..Self::new(category, position, attributes)
        })
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// First of `keys` that has a displayable value
    pub fn display_attribute(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.attribute(key).and_then(AttributeValue::display))
    }

    pub fn name(&self) -> Option<&str> {
        self.display_attribute(&["name", "brand"])
    }
}
